use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::config::AppConfig;
use crate::hooks::filters::{use_filters, FilterActions};
use crate::state::FilterKey;
use crate::store::normalize_search_text;
use crate::APP_CONFIG;

/// 每次输入领取一个新票据，只有最新的票据在等待结束后仍然有效。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebounceGate {
    generation: u64,
}

impl DebounceGate {
    pub fn arm(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation == ticket
    }
}

/// 搜索框的本地状态：输入中的文本、最近一次写入筛选的值与防抖票据。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchBox {
    text: String,
    committed: Option<String>,
    gate: DebounceGate,
}

impl SearchBox {
    pub fn new(committed: Option<String>) -> Self {
        Self {
            text: committed.clone().unwrap_or_default(),
            committed,
            gate: DebounceGate::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn input(&mut self, value: String) -> u64 {
        self.text = value;
        self.gate.arm()
    }

    /// 票据仍是最新时返回要写入筛选的值。
    pub fn take_if_current(&mut self, ticket: u64) -> Option<Option<String>> {
        if !self.gate.is_current(ticket) {
            return None;
        }
        let next = normalize_search_text(Some(self.text.clone()));
        self.committed = next.clone();
        Some(next)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.committed = None;
        self.gate.cancel();
    }

    /// 筛选中的搜索词被别处改写（例如重置）时，作废等待中的输入并跟随新值。
    pub fn follow(&mut self, store_value: Option<&str>) -> bool {
        if store_value == self.committed.as_deref() {
            return false;
        }
        self.committed = store_value.map(str::to_string);
        self.text = store_value.unwrap_or_default().to_string();
        self.gate.cancel();
        true
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct SearchInput {
    search_box: Signal<SearchBox>,
    actions: FilterActions,
}

impl SearchInput {
    pub fn text(&self) -> String {
        self.search_box.read().text().to_string()
    }

    /// 立即更新输入框，停止输入一段时间后才写入筛选。
    pub fn on_input(&self, value: String) {
        let mut search_box = self.search_box;
        let ticket = search_box.write().input(value);
        let actions = self.actions;
        let delay = debounce_millis();

        spawn(async move {
            TimeoutFuture::new(delay).await;
            let next = search_box.write().take_if_current(ticket);
            if let Some(text) = next {
                actions.set_search_text(text);
            }
        });
    }

    /// 只丢弃本地输入，不触碰筛选。
    pub fn discard(&self) {
        let mut search_box = self.search_box;
        search_box.write().clear();
    }

    pub fn clear(&self) {
        self.discard();
        self.actions.clear_filter(FilterKey::SearchText);
    }
}

fn debounce_millis() -> u32 {
    APP_CONFIG
        .get()
        .map(AppConfig::debounce_millis)
        .unwrap_or_else(|| AppConfig::default().debounce_millis())
}

pub fn use_debounced_search() -> SearchInput {
    let actions = use_filters();
    let committed = actions.state().search_text;
    let initial = committed.clone();
    let mut search_box = use_signal(move || SearchBox::new(initial));

    use_effect(use_reactive!(|committed| {
        search_box.write().follow(committed.as_deref());
    }));

    SearchInput {
        search_box,
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_the_latest_ticket_survives() {
        let mut gate = DebounceGate::default();
        let first = gate.arm();
        let second = gate.arm();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn cancel_invalidates_pending_ticket() {
        let mut gate = DebounceGate::default();
        let ticket = gate.arm();
        gate.cancel();
        assert!(!gate.is_current(ticket));
    }

    #[test]
    fn latest_input_is_committed_once() {
        let mut search = SearchBox::new(None);
        let stale = search.input("ип".into());
        let ticket = search.input("ипотека".into());

        assert_eq!(search.take_if_current(stale), None);
        assert_eq!(
            search.take_if_current(ticket),
            Some(Some("ипотека".to_string()))
        );
        assert!(!search.follow(Some("ипотека")));
    }

    #[test]
    fn reset_elsewhere_rejects_pending_input() {
        let mut search = SearchBox::new(None);
        let first = search.input("a".into());
        assert_eq!(search.take_if_current(first), Some(Some("a".to_string())));

        let pending = search.input("ab".into());
        assert!(search.follow(None));

        assert_eq!(search.take_if_current(pending), None);
        assert_eq!(search.text(), "");
    }

    #[test]
    fn discarding_before_reset_rejects_pending_input() {
        let mut search = SearchBox::new(None);
        let pending = search.input("a".into());
        search.clear();
        assert!(!search.follow(None));
        assert_eq!(search.take_if_current(pending), None);
        assert_eq!(search.text(), "");
    }

    #[test]
    fn blank_input_commits_as_absent() {
        let mut search = SearchBox::new(Some("кэшбэк".into()));
        assert_eq!(search.text(), "кэшбэк");

        let ticket = search.input("   ".into());
        assert_eq!(search.take_if_current(ticket), Some(None));
        assert!(!search.follow(None));
    }

    #[test]
    fn external_search_text_replaces_the_box() {
        let mut search = SearchBox::new(None);
        assert!(search.follow(Some("комиссия")));
        assert_eq!(search.text(), "комиссия");
    }
}
