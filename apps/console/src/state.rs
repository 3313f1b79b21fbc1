use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// 默认时间窗口长度（含当天）。
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("date range starts at {from} which is after its end {to}")]
    InvertedDateRange {
        from: OffsetDateTime,
        to: OffsetDateTime,
    },
    #[error("date range is missing its `{0}` endpoint")]
    IncompleteDateRange(&'static str),
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// 闭区间 `[from, to]`，构造时拒绝 `from > to`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    #[serde(with = "time::serde::rfc3339")]
    from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    to: OffsetDateTime,
}

impl DateRange {
    pub fn new(from: OffsetDateTime, to: OffsetDateTime) -> Result<Self, FilterError> {
        if from > to {
            return Err(FilterError::InvertedDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// 以 `now` 结尾的 `days` 天，0 按 1 处理。
    pub fn last_days(now: OffsetDateTime, days: u32) -> Self {
        let span = i64::from(days.max(1) - 1);
        Self {
            from: now - Duration::days(span),
            to: now,
        }
    }

    pub fn default_window(now: OffsetDateTime) -> Self {
        Self::last_days(now, DEFAULT_WINDOW_DAYS)
    }

    pub fn single_day(date: Date) -> Self {
        let instant = date.midnight().assume_utc();
        Self {
            from: instant,
            to: instant,
        }
    }

    pub fn from(&self) -> OffsetDateTime {
        self.from
    }

    pub fn to(&self) -> OffsetDateTime {
        self.to
    }

    pub fn is_single_day(&self) -> bool {
        self.from.date() == self.to.date()
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(with = "time::serde::rfc3339")]
            from: OffsetDateTime,
            #[serde(with = "time::serde::rfc3339")]
            to: OffsetDateTime,
        }

        let raw = Raw::deserialize(deserializer)?;
        DateRange::new(raw.from, raw.to).map_err(serde::de::Error::custom)
    }
}

pub fn parse_iso_date(value: &str) -> Result<Date, FilterError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| FilterError::InvalidDate(value.to_string()))
}

/// 日期选择器的暂存区间，两端齐全前不会写入筛选状态。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRangeDraft {
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
}

impl DateRangeDraft {
    /// 只有 `from` 时暂存为单日区间；只有 `to` 时忽略。
    pub fn select(&mut self, from: Option<OffsetDateTime>, to: Option<OffsetDateTime>) {
        match (from, to) {
            (Some(from), Some(to)) => {
                self.from = Some(from);
                self.to = Some(to);
            }
            (Some(from), None) => {
                self.from = Some(from);
                self.to = Some(from);
            }
            _ => {}
        }
    }

    pub fn set_to(&mut self, to: OffsetDateTime) {
        self.to = Some(to);
    }

    pub fn from(&self) -> Option<OffsetDateTime> {
        self.from
    }

    pub fn to(&self) -> Option<OffsetDateTime> {
        self.to
    }

    pub fn is_ready(&self) -> bool {
        self.commit().is_ok()
    }

    pub fn commit(&self) -> Result<DateRange, FilterError> {
        let from = self.from.ok_or(FilterError::IncompleteDateRange("from"))?;
        let to = self.to.ok_or(FilterError::IncompleteDateRange("to"))?;
        DateRange::new(from, to)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub date_range: DateRange,
    #[serde(default)]
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub products: BTreeSet<String>,
    #[serde(default)]
    pub aspects: BTreeSet<String>,
    #[serde(default)]
    pub sentiments: BTreeSet<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

impl FilterState {
    pub fn initial(now: OffsetDateTime) -> Self {
        Self {
            date_range: DateRange::default_window(now),
            sources: BTreeSet::new(),
            products: BTreeSet::new(),
            aspects: BTreeSet::new(),
            sentiments: BTreeSet::new(),
            search_text: None,
        }
    }

    /// 不计入日期范围：它总是有值。
    pub fn is_filtered(&self) -> bool {
        !self.sources.is_empty()
            || !self.products.is_empty()
            || !self.aspects.is_empty()
            || !self.sentiments.is_empty()
            || self.search_text.is_some()
    }

    pub fn active_filters_count(&self) -> usize {
        self.sources.len()
            + self.products.len()
            + self.aspects.len()
            + self.sentiments.len()
            + usize::from(self.search_text.is_some())
    }

    fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::DateRange(range) => self.date_range = range,
            FilterUpdate::Sources(sources) => self.sources = sources,
            FilterUpdate::Products(products) => self.products = products,
            FilterUpdate::Aspects(aspects) => self.aspects = aspects,
            FilterUpdate::Sentiments(sentiments) => self.sentiments = sentiments,
            FilterUpdate::SearchText(text) => self.search_text = text,
        }
    }

    fn reset(&mut self, key: FilterKey, now: OffsetDateTime) {
        match key {
            FilterKey::DateRange => self.date_range = DateRange::default_window(now),
            FilterKey::Sources => self.sources.clear(),
            FilterKey::Products => self.products.clear(),
            FilterKey::Aspects => self.aspects.clear(),
            FilterKey::Sentiments => self.sentiments.clear(),
            FilterKey::SearchText => self.search_text = None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    DateRange,
    Sources,
    Products,
    Aspects,
    Sentiments,
    SearchText,
}

/// 单个字段的整体替换。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum FilterUpdate {
    DateRange(DateRange),
    Sources(BTreeSet<String>),
    Products(BTreeSet<String>),
    Aspects(BTreeSet<String>),
    Sentiments(BTreeSet<Sentiment>),
    SearchText(Option<String>),
}

#[cfg(test)]
impl FilterUpdate {
    pub fn key(&self) -> FilterKey {
        match self {
            Self::DateRange(_) => FilterKey::DateRange,
            Self::Sources(_) => FilterKey::Sources,
            Self::Products(_) => FilterKey::Products,
            Self::Aspects(_) => FilterKey::Aspects,
            Self::Sentiments(_) => FilterKey::Sentiments,
            Self::SearchText(_) => FilterKey::SearchText,
        }
    }
}

/// 按字段声明顺序逐个应用的部分更新。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub date_range: Option<DateRange>,
    pub sources: Option<BTreeSet<String>>,
    pub products: Option<BTreeSet<String>>,
    pub aspects: Option<BTreeSet<String>>,
    pub sentiments: Option<BTreeSet<Sentiment>>,
    pub search_text: Option<Option<String>>,
}

impl FilterPatch {
    pub fn into_updates(self) -> Vec<FilterUpdate> {
        let mut updates = Vec::new();
        if let Some(range) = self.date_range {
            updates.push(FilterUpdate::DateRange(range));
        }
        if let Some(sources) = self.sources {
            updates.push(FilterUpdate::Sources(sources));
        }
        if let Some(products) = self.products {
            updates.push(FilterUpdate::Products(products));
        }
        if let Some(aspects) = self.aspects {
            updates.push(FilterUpdate::Aspects(aspects));
        }
        if let Some(sentiments) = self.sentiments {
            updates.push(FilterUpdate::Sentiments(sentiments));
        }
        if let Some(text) = self.search_text {
            updates.push(FilterUpdate::SearchText(text));
        }
        updates
    }
}

/// [`reduce`] 接受的动作。缺少 payload 时不做任何修改，
/// 例如 `{"type":"SET_FILTER"}`。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterAction {
    SetFilter {
        #[serde(default)]
        payload: Option<FilterUpdate>,
    },
    ClearFilter {
        #[serde(default)]
        key: Option<FilterKey>,
    },
    ClearAll,
}

impl FilterAction {
    pub fn set(update: FilterUpdate) -> Self {
        Self::SetFilter {
            payload: Some(update),
        }
    }

    pub fn clear(key: FilterKey) -> Self {
        Self::ClearFilter { key: Some(key) }
    }
}

/// 纯状态转换函数，`now` 用于重新计算“最近 30 天”。
pub fn reduce(state: &FilterState, action: FilterAction, now: OffsetDateTime) -> FilterState {
    match action {
        FilterAction::SetFilter {
            payload: Some(update),
        } => {
            let mut next = state.clone();
            next.apply(update);
            next
        }
        FilterAction::ClearFilter { key: Some(key) } => {
            let mut next = state.clone();
            next.reset(key, now);
            next
        }
        FilterAction::ClearAll => FilterState::initial(now),
        FilterAction::SetFilter { payload: None } | FilterAction::ClearFilter { key: None } => {
            state.clone()
        }
    }
}

pub(crate) fn toggle_member<T: Ord + Clone>(set: &BTreeSet<T>, value: T) -> BTreeSet<T> {
    let mut next = set.clone();
    if !next.remove(&value) {
        next.insert(value);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    const ALL_KEYS: [FilterKey; 6] = [
        FilterKey::DateRange,
        FilterKey::Sources,
        FilterKey::Products,
        FilterKey::Aspects,
        FilterKey::Sentiments,
        FilterKey::SearchText,
    ];

    const NOW: OffsetDateTime = datetime!(2024-03-15 12:00 UTC);

    fn products(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn populated() -> FilterState {
        let mut state = FilterState::initial(NOW);
        state.sources = products(&["app-store"]);
        state.products = products(&["credit-cards", "debit-cards"]);
        state.aspects = products(&["fees"]);
        state.sentiments = [Sentiment::Negative].into_iter().collect();
        state.search_text = Some("cashback".into());
        state
    }

    #[test]
    fn initial_state_covers_last_thirty_days() {
        let state = FilterState::initial(NOW);
        assert_eq!(state.date_range.to(), NOW);
        assert_eq!(state.date_range.from(), datetime!(2024-02-15 12:00 UTC));
        assert!(!state.is_filtered());
        assert_eq!(state.active_filters_count(), 0);
    }

    #[test]
    fn clear_all_is_idempotent() {
        let once = reduce(&populated(), FilterAction::ClearAll, NOW);
        let twice = reduce(&once, FilterAction::ClearAll, NOW);
        assert_eq!(once, twice);
        assert_eq!(once, FilterState::initial(NOW));
    }

    #[test]
    fn clear_products_leaves_other_fields_alone() {
        let before = populated();
        let after = reduce(&before, FilterAction::clear(FilterKey::Products), NOW);

        assert!(after.products.is_empty());
        assert_eq!(after.sources, before.sources);
        assert_eq!(after.aspects, before.aspects);
        assert_eq!(after.sentiments, before.sentiments);
        assert_eq!(after.search_text, before.search_text);
        assert_eq!(after.date_range, before.date_range);
    }

    #[test]
    fn clear_date_range_recomputes_from_current_time() {
        let state = FilterState::initial(NOW);
        let later = datetime!(2024-04-01 08:00 UTC);
        let after = reduce(&state, FilterAction::clear(FilterKey::DateRange), later);
        assert_eq!(after.date_range, DateRange::default_window(later));
        assert_ne!(after.date_range, state.date_range);
    }

    #[test]
    fn clear_search_text_makes_it_absent() {
        let after = reduce(&populated(), FilterAction::clear(FilterKey::SearchText), NOW);
        assert_eq!(after.search_text, None);
    }

    #[test]
    fn set_filter_replaces_the_field() {
        let range = DateRange::single_day(date!(2024-01-18));
        let after = reduce(
            &populated(),
            FilterAction::set(FilterUpdate::DateRange(range)),
            NOW,
        );
        assert_eq!(after.date_range, range);
        assert_eq!(after.products, populated().products);
    }

    #[test]
    fn missing_payloads_are_no_ops() {
        let state = populated();
        assert_eq!(
            reduce(&state, FilterAction::SetFilter { payload: None }, NOW),
            state
        );
        assert_eq!(
            reduce(&state, FilterAction::ClearFilter { key: None }, NOW),
            state
        );
    }

    #[test]
    fn malformed_json_actions_decode_to_no_ops() {
        let set: FilterAction = serde_json::from_str(r#"{"type":"SET_FILTER"}"#).unwrap();
        let clear: FilterAction = serde_json::from_str(r#"{"type":"CLEAR_FILTER"}"#).unwrap();
        assert_eq!(set, FilterAction::SetFilter { payload: None });
        assert_eq!(clear, FilterAction::ClearFilter { key: None });
    }

    #[test]
    fn json_actions_use_wire_names() {
        let action: FilterAction = serde_json::from_str(
            r#"{"type":"SET_FILTER","payload":{"key":"sentiments","value":["negative"]}}"#,
        )
        .unwrap();
        let expected = FilterAction::set(FilterUpdate::Sentiments(
            [Sentiment::Negative].into_iter().collect(),
        ));
        assert_eq!(action, expected);

        let clear: FilterAction =
            serde_json::from_str(r#"{"type":"CLEAR_FILTER","key":"searchText"}"#).unwrap();
        assert_eq!(clear, FilterAction::clear(FilterKey::SearchText));
    }

    #[test]
    fn date_range_rejects_inverted_endpoints() {
        let err = DateRange::new(NOW, NOW - Duration::days(1)).unwrap_err();
        assert!(matches!(err, FilterError::InvertedDateRange { .. }));
        assert!(DateRange::new(NOW, NOW).is_ok());
    }

    #[test]
    fn date_range_deserialization_validates_order() {
        let ok: DateRange = serde_json::from_str(
            r#"{"from":"2024-01-01T00:00:00Z","to":"2024-01-31T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok.from(), datetime!(2024-01-01 0:00 UTC));

        let inverted = serde_json::from_str::<DateRange>(
            r#"{"from":"2024-02-01T00:00:00Z","to":"2024-01-31T00:00:00Z"}"#,
        );
        assert!(inverted.is_err());
    }

    #[test]
    fn draft_commits_only_complete_ordered_ranges() {
        let mut draft = DateRangeDraft::default();
        assert_eq!(
            draft.commit(),
            Err(FilterError::IncompleteDateRange("from"))
        );

        draft.select(None, Some(NOW));
        assert!(!draft.is_ready());

        draft.select(Some(NOW), None);
        let staged = draft.commit().unwrap();
        assert_eq!(staged.from(), staged.to());

        draft.select(Some(NOW), Some(NOW - Duration::days(2)));
        assert!(matches!(
            draft.commit(),
            Err(FilterError::InvertedDateRange { .. })
        ));

        draft.clear();
        assert!(!draft.is_ready());

        draft.set_to(NOW);
        assert_eq!(draft.commit(), Err(FilterError::IncompleteDateRange("from")));
        draft.select(Some(NOW - Duration::days(3)), draft.to());
        assert_eq!(draft.commit().unwrap().to(), NOW);
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_iso_date("2024-01-18").unwrap(), date!(2024-01-18));
        assert_eq!(
            parse_iso_date("18.01.2024"),
            Err(FilterError::InvalidDate("18.01.2024".into()))
        );
    }

    #[test]
    fn patch_updates_follow_field_order() {
        let patch = FilterPatch {
            search_text: Some(None),
            sources: Some(products(&["banki-ru"])),
            ..FilterPatch::default()
        };
        let keys: Vec<FilterKey> = patch.into_updates().iter().map(FilterUpdate::key).collect();
        assert_eq!(keys, vec![FilterKey::Sources, FilterKey::SearchText]);
    }

    fn arb_ids() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(
            prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from),
            0..4,
        )
    }

    fn arb_action() -> impl Strategy<Value = FilterAction> {
        let sentiments =
            prop::collection::btree_set(prop::sample::select(Sentiment::ALL.to_vec()), 0..3);
        let text = prop::option::of(
            prop::sample::select(vec!["", "fees", "app"]).prop_map(String::from),
        );
        let key = prop::sample::select(ALL_KEYS.to_vec());

        prop_oneof![
            arb_ids().prop_map(|v| FilterAction::set(FilterUpdate::Sources(v))),
            arb_ids().prop_map(|v| FilterAction::set(FilterUpdate::Products(v))),
            arb_ids().prop_map(|v| FilterAction::set(FilterUpdate::Aspects(v))),
            sentiments.prop_map(|v| FilterAction::set(FilterUpdate::Sentiments(v))),
            text.prop_map(|v| FilterAction::set(FilterUpdate::SearchText(v))),
            key.prop_map(FilterAction::clear),
            Just(FilterAction::ClearAll),
        ]
    }

    proptest! {
        #[test]
        fn active_count_matches_field_lengths(actions in prop::collection::vec(arb_action(), 0..24)) {
            let mut state = FilterState::initial(NOW);
            for action in actions {
                state = reduce(&state, action, NOW);
                let expected = state.sources.len()
                    + state.products.len()
                    + state.aspects.len()
                    + state.sentiments.len()
                    + usize::from(state.search_text.is_some());
                prop_assert_eq!(state.active_filters_count(), expected);
                prop_assert_eq!(state.is_filtered(), expected > 0);
            }
        }

        #[test]
        fn toggling_twice_restores_the_set(
            start in prop::collection::btree_set("[a-d]", 0..4),
            value in "[a-f]",
        ) {
            let once = toggle_member(&start, value.clone());
            prop_assert_ne!(&once, &start);
            let twice = toggle_member(&once, value);
            prop_assert_eq!(twice, start);
        }
    }
}
