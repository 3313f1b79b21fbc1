#![allow(non_snake_case)]

mod api;
mod config;
mod fixtures;
mod hooks;
mod models;
mod state;
mod store;
mod trends;
mod ui;

use api::{ClientError, FeedbackClient};
use config::AppConfig;
use dioxus::prelude::*;
use dioxus_router::prelude::*;
use hooks::config::use_config_loader;
use hooks::dashboard::{use_overview_loader, OverviewCache};
use once_cell::sync::OnceCell;
use store::FilterStore;
use tracing::{error, info};
use ui::filters::FilterBar;
use ui::metrics::MetricsPanel;
use ui::sentiment::SentimentDynamicsPanel;

pub(crate) static APP_CONFIG: OnceCell<AppConfig> = OnceCell::new();
pub(crate) static API_CLIENT: OnceCell<FeedbackClient> = OnceCell::new();

fn main() {
    console_error_panic_hook::set_once();
    init_logging();
    bootstrap_infrastructure();
    launch(App);
}

fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = dioxus_logger::init(tracing::Level::INFO);
    });
}

fn bootstrap_infrastructure() {
    let config = AppConfig::from_env();
    let _ = APP_CONFIG.set(config.clone());

    match FeedbackClient::new(config) {
        Ok(client) => {
            info!(
                base_url = %client.config().api_base_url,
                prod = client.config().is_prod(),
                "feedback API client initialized"
            );
            let _ = API_CLIENT.set(client);
        }
        Err(err) => {
            report_client_error("failed to initialise feedback API client", &err);
        }
    }
}

fn report_client_error(context: &str, err: &ClientError) {
    error!(%context, ?err, status = ?err.status(), "api bootstrap error");
}

#[component]
fn App() -> Element {
    use_context_provider(|| Signal::new(FilterStore::new()));
    use_context_provider(|| Signal::new(OverviewCache::default()));
    use_config_loader();

    rsx! {
        div { class: "relative",
            Router::<Route> {}
        }
    }
}

#[derive(Clone, Routable, Debug, PartialEq)]
enum Route {
    #[route("/")]
    Dashboard {},
}

#[component]
fn Dashboard() -> Element {
    use_overview_loader();

    let api_endpoint = APP_CONFIG
        .get()
        .map(|c| c.api_base_url.clone())
        .unwrap_or_else(|| "API не настроен".to_string());

    rsx! {
        div { class: "app-shell space-y-4",
            section { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
                h1 { class: "text-xl font-semibold text-slate-900", "Аналитика отзывов" }
                p { class: "text-sm text-slate-600", "API: {api_endpoint}" }
            }
            FilterBar {}
            MetricsPanel {}
            SentimentDynamicsPanel {}
        }
    }
}
