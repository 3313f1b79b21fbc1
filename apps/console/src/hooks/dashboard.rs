//! 看板概览数据。
//!
//! 以完整的 [`FilterState`] 作为缓存键：任一筛选字段变化都会换键并重新请求，
//! 晚到的旧响应只写入自己的缓存槽，不会覆盖当前视图。

use std::collections::HashMap;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use time::{Duration, OffsetDateTime};
use tracing::{debug, error};

use crate::config::staleness_window;
use crate::hooks::filters::use_filter_store;
use crate::models::{DashboardOverview, OverviewRequest};
use crate::state::FilterState;
use crate::{API_CLIENT, APP_CONFIG};

pub const LOAD_FAILED_MESSAGE: &str =
    "Не удалось загрузить данные дашборда. Попробуйте обновить страницу.";

#[derive(Clone, Debug)]
struct CachedOverview {
    overview: DashboardOverview,
    fetched_at: OffsetDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct OverviewCache {
    entries: HashMap<FilterState, CachedOverview>,
}

impl OverviewCache {
    /// 命中且未过期时返回缓存的概览。
    pub fn fresh(
        &self,
        key: &FilterState,
        now: OffsetDateTime,
        stale_after: Duration,
    ) -> Option<DashboardOverview> {
        self.entries
            .get(key)
            .filter(|entry| now - entry.fetched_at < stale_after)
            .map(|entry| entry.overview.clone())
    }

    pub fn insert(&mut self, key: FilterState, overview: DashboardOverview, now: OffsetDateTime) {
        self.entries.insert(
            key,
            CachedOverview {
                overview,
                fetched_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &FilterState) {
        self.entries.remove(key);
    }

    /// 丢弃超过 `max_age` 的条目。
    pub fn prune(&mut self, now: OffsetDateTime, max_age: Duration) {
        self.entries.retain(|_, entry| now - entry.fetched_at < max_age);
    }
}

pub type OverviewCacheSignal = Signal<OverviewCache>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardDataState {
    pub loading: bool,
    pub error: Option<String>,
    pub overview: DashboardOverview,
    pub key: Option<FilterState>,
}

impl DashboardDataState {
    fn begin(&mut self, key: FilterState) {
        self.key = Some(key);
        self.loading = true;
        self.error = None;
    }

    /// 仅当 `key` 仍是当前筛选组合时写入结果；返回是否生效。
    fn settle(&mut self, key: &FilterState, outcome: Result<DashboardOverview, String>) -> bool {
        if self.key.as_ref() != Some(key) {
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(overview) => {
                self.overview = overview;
                self.error = None;
            }
            Err(message) => {
                self.overview = DashboardOverview::default();
                self.error = Some(message);
            }
        }
        true
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct DashboardData {
    pub state: Signal<DashboardDataState>,
    generation: Signal<u64>,
    cache: OverviewCacheSignal,
}

impl DashboardData {
    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// 丢弃当前筛选组合的缓存并重新请求。
    pub fn refetch(&self) {
        let key = self.state.peek().key.clone();
        if let Some(key) = key {
            let mut cache = self.cache;
            cache.write().invalidate(&key);
        }
        let mut generation = self.generation;
        *generation.write() += 1;
    }
}

/// 页面级加载器：发起请求并把结果放进上下文，各面板共享同一份数据。
pub fn use_overview_loader() -> DashboardData {
    let store = use_filter_store();
    let cache = use_context::<OverviewCacheSignal>();
    let state = use_signal(DashboardDataState::default);
    let generation = use_signal(|| 0u64);

    let filters = store.read().state().clone();
    let attempt = *generation.read();

    use_future(use_reactive!(|(filters, attempt)| {
        async move {
            load_overview(filters, state, cache).await;
        }
    }));

    use_context_provider(|| DashboardData {
        state,
        generation,
        cache,
    })
}

pub fn use_dashboard_data() -> DashboardData {
    use_context::<DashboardData>()
}

async fn load_overview(
    filters: FilterState,
    mut state: Signal<DashboardDataState>,
    mut cache: OverviewCacheSignal,
) {
    let stale_after = APP_CONFIG
        .get()
        .map(|cfg| staleness_window(cfg.overview_stale_after))
        .unwrap_or(Duration::ZERO);

    state.write().begin(filters.clone());

    let now = OffsetDateTime::now_utc();
    let cached = cache.read().fresh(&filters, now, stale_after);
    if let Some(overview) = cached {
        debug!("serving dashboard overview from cache");
        state.write().settle(&filters, Ok(overview));
        return;
    }

    // 让出一帧，连续的筛选变更只会保留最后一次请求
    TimeoutFuture::new(0).await;

    let Some(client) = API_CLIENT.get().cloned() else {
        error!("feedback API client is not initialised");
        state
            .write()
            .settle(&filters, Err(LOAD_FAILED_MESSAGE.to_string()));
        return;
    };

    let request = OverviewRequest::from_filters(&filters);
    match client.post_overview(&request).await {
        Ok(response) => {
            let overview = DashboardOverview::from(response);
            let fetched_at = OffsetDateTime::now_utc();
            {
                let mut cache = cache.write();
                cache.prune(fetched_at, stale_after);
                cache.insert(filters.clone(), overview.clone(), fetched_at);
            }
            if !state.write().settle(&filters, Ok(overview)) {
                debug!("discarding overview for superseded filters");
            }
        }
        Err(err) => {
            error!(?err, status = ?err.status(), "failed to load dashboard overview");
            state
                .write()
                .settle(&filters, Err(LOAD_FAILED_MESSAGE.to_string()));
        }
    }
}
