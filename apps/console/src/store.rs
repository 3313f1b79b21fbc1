use std::collections::BTreeSet;

use time::{Date, Duration, Month, OffsetDateTime};
use tracing::{debug, warn};

use crate::fixtures::reference::{BUILTIN_DATE_PRESETS, FALLBACK_PRODUCTS, FALLBACK_SOURCES};
use crate::models::{ConfigResponse, DatePresetSchema, ProductOption, SourceOption};
use crate::state::{
    reduce, toggle_member, DateRange, FilterAction, FilterKey, FilterPatch, FilterState,
    FilterUpdate, Sentiment,
};

pub type Clock = fn() -> OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresetRange {
    LastDays(u32),
    CurrentMonth,
    CurrentQuarter,
}

impl PresetRange {
    pub fn resolve(&self, now: OffsetDateTime) -> DateRange {
        match self {
            Self::LastDays(days) => DateRange::last_days(now, *days),
            Self::CurrentMonth => start_of(now, now.month()),
            Self::CurrentQuarter => {
                let quarter_start = (u8::from(now.month()) - 1) / 3 * 3 + 1;
                let month = Month::try_from(quarter_start).unwrap_or(Month::January);
                start_of(now, month)
            }
        }
    }
}

fn start_of(now: OffsetDateTime, month: Month) -> DateRange {
    let first = Date::from_calendar_date(now.year(), month, 1)
        .map(|date| date.midnight().assume_offset(now.offset()))
        .unwrap_or(now);
    DateRange::new(first, now).unwrap_or_else(|_| DateRange::last_days(now, 1))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatePreset {
    pub label: String,
    pub value: String,
    pub range: PresetRange,
}

impl DatePreset {
    pub fn new(label: impl Into<String>, value: impl Into<String>, range: PresetRange) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            range,
        }
    }

    pub fn range_at(&self, now: OffsetDateTime) -> DateRange {
        self.range.resolve(now)
    }
}

impl From<&DatePresetSchema> for DatePreset {
    fn from(schema: &DatePresetSchema) -> Self {
        let value = schema
            .label
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        Self::new(schema.label.clone(), value, PresetRange::LastDays(schema.days))
    }
}

/// 参考数据（来源、产品、日期预设）的加载阶段。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConfigStatus {
    #[default]
    Loading,
    Ready {
        config: ConfigResponse,
        loaded_at: OffsetDateTime,
    },
    Failed(String),
}

/// 统一筛选存储：唯一持有 [`FilterState`] 的对象，所有修改都经由 [`reduce`]。
#[derive(Clone, Debug)]
pub struct FilterStore {
    state: FilterState,
    config: ConfigStatus,
    clock: Clock,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStore {
    pub fn new() -> Self {
        Self::with_clock(OffsetDateTime::now_utc)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: FilterState::initial(clock()),
            config: ConfigStatus::Loading,
            clock,
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn dispatch(&mut self, action: FilterAction) {
        debug!(?action, "dispatching filter action");
        let now = self.now();
        self.state = reduce(&self.state, action, now);
    }

    /// 空白搜索词在此统一视为未设置。
    pub fn set_filter(&mut self, update: FilterUpdate) {
        let update = match update {
            FilterUpdate::SearchText(text) => FilterUpdate::SearchText(normalize_search_text(text)),
            other => other,
        };
        self.dispatch(FilterAction::set(update));
    }

    pub fn clear_filter(&mut self, key: FilterKey) {
        self.dispatch(FilterAction::clear(key));
    }

    pub fn clear_all_filters(&mut self) {
        self.dispatch(FilterAction::ClearAll);
    }

    pub fn reset_filters(&mut self) {
        self.clear_all_filters();
    }

    /// 每个字段单独派发一次 `SET_FILTER`，不保证中间状态的原子性。
    pub fn update_filters(&mut self, patch: FilterPatch) {
        for update in patch.into_updates() {
            self.set_filter(update);
        }
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.set_filter(FilterUpdate::DateRange(range));
    }

    pub fn set_sources<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_filter(FilterUpdate::Sources(collect_ids(sources)));
    }

    pub fn set_products<I, S>(&mut self, products: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_filter(FilterUpdate::Products(collect_ids(products)));
    }

    pub fn set_search_text(&mut self, text: Option<String>) {
        self.set_filter(FilterUpdate::SearchText(text));
    }

    pub fn filter_by_product(&mut self, product: &str) {
        let next = toggle_member(&self.state.products, product.to_string());
        self.set_filter(FilterUpdate::Products(next));
    }

    pub fn filter_by_aspect(&mut self, aspect: &str) {
        let next = toggle_member(&self.state.aspects, aspect.to_string());
        self.set_filter(FilterUpdate::Aspects(next));
    }

    pub fn filter_by_sentiment(&mut self, sentiment: Sentiment) {
        let next = toggle_member(&self.state.sentiments, sentiment);
        self.set_filter(FilterUpdate::Sentiments(next));
    }

    pub fn filter_by_source(&mut self, source: &str) {
        let next = toggle_member(&self.state.sources, source.to_string());
        self.set_filter(FilterUpdate::Sources(next));
    }

    /// 下钻到单日；给定情绪时把情绪筛选收窄为该值。
    pub fn drill_down(&mut self, date: Date, sentiment: Option<Sentiment>) {
        self.update_filters(FilterPatch {
            date_range: Some(DateRange::single_day(date)),
            sentiments: sentiment.map(|sentiment| BTreeSet::from([sentiment])),
            ..FilterPatch::default()
        });
    }

    pub fn is_filtered(&self) -> bool {
        self.state.is_filtered()
    }

    pub fn active_filters_count(&self) -> usize {
        self.state.active_filters_count()
    }

    pub fn config_loading(&self) -> bool {
        matches!(self.config, ConfigStatus::Loading)
    }

    pub fn config_error(&self) -> Option<&str> {
        match &self.config {
            ConfigStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// 已加载且未超过 `stale_after` 时无需重新拉取。
    pub fn config_is_fresh(&self, stale_after: Duration) -> bool {
        match &self.config {
            ConfigStatus::Ready { loaded_at, .. } => self.now() - *loaded_at < stale_after,
            _ => false,
        }
    }

    pub fn set_reference_data(&mut self, config: ConfigResponse) {
        debug!(
            sources = config.sources.len(),
            products = config.products.len(),
            presets = ?config.date_presets.as_ref().map(Vec::len),
            "reference data loaded"
        );
        self.config = ConfigStatus::Ready {
            config,
            loaded_at: self.now(),
        };
    }

    /// 只切换参考数据为兜底列表，已选筛选项保持不变。
    pub fn set_config_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "reference data unavailable, using fallback lists");
        self.config = ConfigStatus::Failed(message);
    }

    pub fn available_sources(&self) -> &[SourceOption] {
        match &self.config {
            ConfigStatus::Failed(_) => FALLBACK_SOURCES.as_slice(),
            ConfigStatus::Ready { config, .. } => config.sources.as_slice(),
            ConfigStatus::Loading => &[],
        }
    }

    pub fn available_products(&self) -> &[ProductOption] {
        match &self.config {
            ConfigStatus::Failed(_) => FALLBACK_PRODUCTS.as_slice(),
            ConfigStatus::Ready { config, .. } => config.products.as_slice(),
            ConfigStatus::Loading => &[],
        }
    }

    pub fn date_presets(&self) -> Vec<DatePreset> {
        match &self.config {
            ConfigStatus::Failed(_) => BUILTIN_DATE_PRESETS.to_vec(),
            ConfigStatus::Ready { config, .. } => match &config.date_presets {
                Some(presets) => presets.iter().map(DatePreset::from).collect(),
                None => BUILTIN_DATE_PRESETS.to_vec(),
            },
            ConfigStatus::Loading => Vec::new(),
        }
    }

    pub fn apply_preset(&mut self, preset: &DatePreset) {
        let range = preset.range_at(self.now());
        self.set_date_range(range);
    }
}

fn collect_ids<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

pub(crate) fn normalize_search_text(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    fn fixed_now() -> OffsetDateTime {
        datetime!(2024-05-20 09:30 UTC)
    }

    fn store() -> FilterStore {
        FilterStore::with_clock(fixed_now)
    }

    fn sample_config(presets: Option<Vec<DatePresetSchema>>) -> ConfigResponse {
        ConfigResponse {
            sources: vec![SourceOption {
                value: "sravni-ru".into(),
                label: "Sravni.ru".into(),
            }],
            products: vec![ProductOption {
                value: "mobile-app".into(),
                label: "Мобильное приложение".into(),
                category: "Digital".into(),
            }],
            date_presets: presets,
        }
    }

    #[test]
    fn default_store_is_not_filtered() {
        let store = store();
        assert!(!store.is_filtered());
        assert_eq!(store.active_filters_count(), 0);
        assert_eq!(store.state().date_range, DateRange::default_window(fixed_now()));
    }

    #[test]
    fn product_toggle_adds_then_removes() {
        let mut store = store();
        store.filter_by_product("credit-cards");
        assert_eq!(
            store.state().products,
            BTreeSet::from(["credit-cards".to_string()])
        );

        store.filter_by_product("credit-cards");
        assert!(store.state().products.is_empty());
    }

    #[test]
    fn toggles_never_duplicate() {
        let mut store = store();
        store.filter_by_aspect("fees");
        store.filter_by_sentiment(Sentiment::Negative);
        store.filter_by_aspect("support");
        assert_eq!(store.state().aspects.len(), 2);
        assert_eq!(store.active_filters_count(), 3);

        store.filter_by_sentiment(Sentiment::Negative);
        assert!(store.state().sentiments.is_empty());
    }

    #[test]
    fn set_products_collapses_duplicates() {
        let mut store = store();
        store.set_products(["a", "b", "a"]);
        assert_eq!(store.state().products.len(), 2);
    }

    #[test]
    fn blank_search_text_is_treated_as_absent() {
        let mut store = store();
        store.set_search_text(Some("   ".into()));
        assert_eq!(store.state().search_text, None);
        assert!(!store.is_filtered());

        store.set_search_text(Some("кэшбэк".into()));
        assert_eq!(store.state().search_text.as_deref(), Some("кэшбэк"));
        assert_eq!(store.active_filters_count(), 1);
    }

    #[test]
    fn update_filters_converges_to_patch_values() {
        let mut store = store();
        store.filter_by_aspect("fees");
        let range = DateRange::single_day(date!(2024-05-01));
        store.update_filters(FilterPatch {
            date_range: Some(range),
            sources: Some(BTreeSet::from(["banki-ru".to_string()])),
            search_text: Some(Some("ипотека".into())),
            ..FilterPatch::default()
        });

        let state = store.state();
        assert_eq!(state.date_range, range);
        assert!(state.sources.contains("banki-ru"));
        assert!(state.aspects.contains("fees"));
        assert_eq!(state.search_text.as_deref(), Some("ипотека"));
    }

    #[test]
    fn reset_filters_matches_clear_all() {
        let mut left = store();
        let mut right = store();
        for store in [&mut left, &mut right] {
            store.filter_by_product("mortgage");
            store.set_search_text(Some("rate".into()));
        }
        left.reset_filters();
        right.clear_all_filters();
        assert_eq!(left.state(), right.state());
        assert!(!left.is_filtered());
    }

    #[test]
    fn drill_down_sets_single_day_and_keeps_sentiments() {
        let mut store = store();
        store.filter_by_sentiment(Sentiment::Positive);
        store.drill_down(date!(2024-01-18), None);

        let range = store.state().date_range;
        assert_eq!(range.from(), datetime!(2024-01-18 0:00 UTC));
        assert_eq!(range.from(), range.to());
        assert_eq!(
            store.state().sentiments,
            BTreeSet::from([Sentiment::Positive])
        );
    }

    #[test]
    fn drill_down_with_sentiment_narrows_to_singleton() {
        let mut store = store();
        store.filter_by_sentiment(Sentiment::Positive);
        store.filter_by_sentiment(Sentiment::Neutral);
        store.drill_down(date!(2024-01-18), Some(Sentiment::Negative));
        assert_eq!(
            store.state().sentiments,
            BTreeSet::from([Sentiment::Negative])
        );
    }

    #[test]
    fn loading_config_exposes_empty_reference_lists() {
        let store = store();
        assert!(store.config_loading());
        assert!(store.available_sources().is_empty());
        assert!(store.available_products().is_empty());
        assert!(store.date_presets().is_empty());
    }

    #[test]
    fn failed_config_switches_to_fallback_lists() {
        let mut store = store();
        store.filter_by_product("discontinued-product");
        store.set_config_error("connection refused");

        assert_eq!(store.config_error(), Some("connection refused"));
        assert_eq!(store.available_sources(), FALLBACK_SOURCES.as_slice());
        assert_eq!(store.available_products(), FALLBACK_PRODUCTS.as_slice());
        assert_eq!(store.date_presets(), *BUILTIN_DATE_PRESETS);
        assert!(store.state().products.contains("discontinued-product"));
    }

    #[test]
    fn loaded_config_is_used_verbatim() {
        let mut store = store();
        store.set_reference_data(sample_config(Some(vec![DatePresetSchema {
            label: "Последние 90  дней".into(),
            days: 90,
        }])));

        assert_eq!(store.available_sources()[0].value, "sravni-ru");
        assert_eq!(store.available_products().len(), 1);

        let presets = store.date_presets();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].value, "последние-90-дней");
        assert_eq!(
            presets[0].range_at(fixed_now()),
            DateRange::last_days(fixed_now(), 90)
        );
    }

    #[test]
    fn loaded_config_without_presets_uses_builtin_list() {
        let mut store = store();
        store.set_reference_data(sample_config(None));
        assert_eq!(store.date_presets(), *BUILTIN_DATE_PRESETS);
    }

    #[test]
    fn freshness_tracks_load_time() {
        let mut store = store();
        assert!(!store.config_is_fresh(Duration::minutes(2)));
        store.set_reference_data(sample_config(None));
        assert!(store.config_is_fresh(Duration::minutes(2)));
        assert!(!store.config_is_fresh(Duration::ZERO));
    }

    #[test]
    fn builtin_presets_resolve_against_now() {
        let now = fixed_now();
        assert_eq!(
            PresetRange::CurrentMonth.resolve(now).from(),
            datetime!(2024-05-01 0:00 UTC)
        );
        assert_eq!(
            PresetRange::CurrentQuarter.resolve(now).from(),
            datetime!(2024-04-01 0:00 UTC)
        );
        assert_eq!(
            PresetRange::LastDays(7).resolve(now).from(),
            datetime!(2024-05-14 09:30 UTC)
        );
    }

    #[test]
    fn applying_a_preset_sets_the_range() {
        let mut store = store();
        store.apply_preset(&BUILTIN_DATE_PRESETS[0]);
        assert_eq!(
            store.state().date_range,
            DateRange::last_days(fixed_now(), 7)
        );
    }

    proptest! {
        #[test]
        fn double_toggle_restores_products(
            initial in prop::collection::btree_set("[a-c]", 0..3),
            product in "[d-f]",
        ) {
            let mut store = store();
            store.set_products(initial.clone());
            store.filter_by_product(&product);
            prop_assert!(store.state().products.contains(&product));
            store.filter_by_product(&product);
            prop_assert_eq!(&store.state().products, &initial);
        }
    }
}
