use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use tracing::{error, info, warn};

use crate::api::{ClientResult, FeedbackClient};
use crate::config::staleness_window;
use crate::hooks::filters::{use_filters, FilterActions};
use crate::models::ConfigResponse;
use crate::{API_CLIENT, APP_CONFIG};

const CONFIG_RETRY_DELAY_MS: u32 = 1_000;

/// 拉取来源、产品与日期预设；失败时切换为兜底列表。
pub fn use_config_loader() {
    let actions = use_filters();

    use_future(move || async move {
        load_reference_data(actions).await;
    });
}

async fn load_reference_data(actions: FilterActions) {
    let stale_after = APP_CONFIG
        .get()
        .map(|cfg| staleness_window(cfg.config_stale_after))
        .unwrap_or(time::Duration::ZERO);
    if actions.config_is_fresh(stale_after) {
        return;
    }

    let client = match API_CLIENT.get().cloned() {
        Some(client) => client,
        None => {
            actions.set_config_error("feedback API client is not initialised");
            return;
        }
    };

    match fetch_with_retry(&client).await {
        Ok(config) => {
            info!(
                sources = config.sources.len(),
                products = config.products.len(),
                "reference data fetched"
            );
            actions.set_reference_data(config);
        }
        Err(err) => {
            error!(?err, status = ?err.status(), "failed to fetch reference data");
            actions.set_config_error(err.to_string());
        }
    }
}

async fn fetch_with_retry(client: &FeedbackClient) -> ClientResult<ConfigResponse> {
    match client.get_config().await {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(?err, "reference data request failed, retrying once");
            TimeoutFuture::new(CONFIG_RETRY_DELAY_MS).await;
            client.get_config().await
        }
    }
}
