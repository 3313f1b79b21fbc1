//! 统一筛选入口。
//!
//! 页面上所有组件都通过这里拿到同一个 [`FilterStore`]；`use_filters` 与
//! `use_dashboard` 是同一对象的两个名字，交叉筛选只暴露三个切换动作。

use dioxus::prelude::*;
use time::Date;

use crate::models::{ConfigResponse, ProductOption, SourceOption};
use crate::state::{DateRange, FilterKey, FilterPatch, FilterState, FilterUpdate, Sentiment};
use crate::store::{DatePreset, FilterStore};

pub type FilterSignal = Signal<FilterStore>;

#[derive(Clone, Copy, PartialEq)]
pub struct FilterActions {
    store: FilterSignal,
}

impl FilterActions {
    pub fn new(store: FilterSignal) -> Self {
        Self { store }
    }

    fn update(&self, apply: impl FnOnce(&mut FilterStore)) {
        let mut store = self.store;
        apply(&mut store.write());
    }

    pub fn state(&self) -> FilterState {
        self.store.read().state().clone()
    }

    #[allow(dead_code)]
    pub fn filters(&self) -> FilterState {
        self.state()
    }

    #[allow(dead_code)]
    pub fn set_filter(&self, update: FilterUpdate) {
        self.update(|store| store.set_filter(update));
    }

    pub fn clear_filter(&self, key: FilterKey) {
        self.update(|store| store.clear_filter(key));
    }

    #[allow(dead_code)]
    pub fn clear_all_filters(&self) {
        self.update(FilterStore::clear_all_filters);
    }

    pub fn reset_filters(&self) {
        self.update(FilterStore::reset_filters);
    }

    #[allow(dead_code)]
    pub fn update_filters(&self, patch: FilterPatch) {
        self.update(|store| store.update_filters(patch));
    }

    pub fn set_date_range(&self, range: DateRange) {
        self.update(|store| store.set_date_range(range));
    }

    #[allow(dead_code)]
    pub fn set_sources(&self, sources: Vec<String>) {
        self.update(|store| store.set_sources(sources));
    }

    #[allow(dead_code)]
    pub fn set_products(&self, products: Vec<String>) {
        self.update(|store| store.set_products(products));
    }

    pub fn set_search_text(&self, text: Option<String>) {
        self.update(|store| store.set_search_text(text));
    }

    pub fn filter_by_product(&self, product: &str) {
        self.update(|store| store.filter_by_product(product));
    }

    pub fn filter_by_aspect(&self, aspect: &str) {
        self.update(|store| store.filter_by_aspect(aspect));
    }

    pub fn filter_by_sentiment(&self, sentiment: Sentiment) {
        self.update(|store| store.filter_by_sentiment(sentiment));
    }

    pub fn filter_by_source(&self, source: &str) {
        self.update(|store| store.filter_by_source(source));
    }

    pub fn drill_down(&self, date: Date, sentiment: Option<Sentiment>) {
        self.update(|store| store.drill_down(date, sentiment));
    }

    pub fn apply_preset(&self, preset: &DatePreset) {
        self.update(|store| store.apply_preset(preset));
    }

    pub fn is_filtered(&self) -> bool {
        self.store.read().is_filtered()
    }

    pub fn active_filters_count(&self) -> usize {
        self.store.read().active_filters_count()
    }

    pub fn available_sources(&self) -> Vec<SourceOption> {
        self.store.read().available_sources().to_vec()
    }

    pub fn available_products(&self) -> Vec<ProductOption> {
        self.store.read().available_products().to_vec()
    }

    pub fn date_presets(&self) -> Vec<DatePreset> {
        self.store.read().date_presets()
    }

    pub fn config_loading(&self) -> bool {
        self.store.read().config_loading()
    }

    pub fn config_error(&self) -> Option<String> {
        self.store.read().config_error().map(str::to_string)
    }

    pub fn config_is_fresh(&self, stale_after: time::Duration) -> bool {
        self.store.peek().config_is_fresh(stale_after)
    }

    pub fn set_reference_data(&self, config: ConfigResponse) {
        self.update(|store| store.set_reference_data(config));
    }

    pub fn set_config_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|store| store.set_config_error(message));
    }
}

/// 图表之间的交叉筛选：只提供切换动作与当前筛选快照。
#[derive(Clone, Copy, PartialEq)]
pub struct CrossFilter {
    actions: FilterActions,
}

impl CrossFilter {
    pub fn filter_by_product(&self, product: &str) {
        self.actions.filter_by_product(product);
    }

    #[allow(dead_code)]
    pub fn filter_by_aspect(&self, aspect: &str) {
        self.actions.filter_by_aspect(aspect);
    }

    pub fn filter_by_sentiment(&self, sentiment: Sentiment) {
        self.actions.filter_by_sentiment(sentiment);
    }

    pub fn current_filters(&self) -> FilterState {
        self.actions.state()
    }
}

pub fn use_filter_store() -> FilterSignal {
    use_context::<FilterSignal>()
}

pub fn use_filters() -> FilterActions {
    FilterActions::new(use_filter_store())
}

pub fn use_dashboard() -> FilterActions {
    use_filters()
}

pub fn use_cross_filter() -> CrossFilter {
    CrossFilter {
        actions: use_filters(),
    }
}
