//! 筛选栏
//!
//! 日期预设与自定义区间、来源与产品多选、全文搜索，以及已生效筛选的计数与重置。

use dioxus::prelude::*;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::hooks::filters::{use_cross_filter, use_filters, CrossFilter, FilterActions};
use crate::hooks::search::use_debounced_search;
use crate::models::{ProductOption, SourceOption};
use crate::state::{parse_iso_date, DateRange, DateRangeDraft, FilterState};
use crate::store::DatePreset;

#[component]
pub fn FilterBar() -> Element {
    let actions = use_filters();
    let search = use_debounced_search();
    let cross = use_cross_filter();

    let state = actions.state();
    let active = actions.active_filters_count();
    let config_error = actions.config_error();
    let search_text = search.text();
    let range_label = format_range(&state.date_range);

    let reference = if actions.config_loading() {
        rsx! { p { class: "text-xs text-slate-500", "Загрузка справочников..." } }
    } else {
        rsx! {
            div { class: "grid gap-4 md:grid-cols-2",
                {render_sources(actions, &actions.available_sources(), &state)}
                {render_products(cross, &actions.available_products(), &state)}
            }
        }
    };

    rsx! {
        section { class: "space-y-3 rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
            header { class: "flex items-center justify-between",
                div { class: "flex flex-col gap-1",
                    h2 { class: "text-lg font-semibold text-slate-900", "Фильтры" }
                    p { class: "text-xs text-slate-500", "Период: {range_label}" }
                }
                if actions.is_filtered() {
                    button {
                        class: "rounded border border-slate-300 px-3 py-1 text-xs text-slate-700 hover:bg-slate-100",
                        onclick: move |_| {
                            search.discard();
                            actions.reset_filters();
                        },
                        "Сбросить фильтры ({active})"
                    }
                }
            }
            if let Some(err) = config_error {
                p { class: "rounded bg-amber-50 px-3 py-2 text-xs text-amber-700",
                    "Справочники недоступны, показаны значения по умолчанию ({err})"
                }
            }
            {render_presets(actions, actions.date_presets())}
            DateRangePicker {}
            {reference}
            div { class: "flex items-center gap-2",
                input {
                    class: "w-full rounded border border-slate-300 px-3 py-2 text-sm",
                    r#type: "search",
                    placeholder: "Поиск по тексту отзывов",
                    value: "{search_text}",
                    oninput: move |evt: FormEvent| search.on_input(evt.value()),
                }
                if !search_text.is_empty() {
                    button {
                        class: "text-xs text-slate-500 hover:text-slate-800",
                        onclick: move |_| search.clear(),
                        "Очистить"
                    }
                }
            }
        }
    }
}

fn render_presets(actions: FilterActions, presets: Vec<DatePreset>) -> Element {
    rsx! {
        div { class: "flex flex-wrap gap-2",
            {presets.into_iter().map(|preset| {
                let key = preset.value.clone();
                let label = preset.label.clone();
                rsx! {
                    button {
                        key: "{key}",
                        class: "rounded-full bg-slate-100 px-3 py-1 text-xs text-slate-700 hover:bg-slate-200",
                        onclick: move |_| actions.apply_preset(&preset),
                        "{label}"
                    }
                }
            })}
        }
    }
}

fn render_sources(actions: FilterActions, sources: &[SourceOption], state: &FilterState) -> Element {
    rsx! {
        fieldset { class: "space-y-1",
            legend { class: "text-xs font-medium text-slate-600", "Источники" }
            {sources.iter().map(|source| {
                let checked = state.sources.contains(&source.value);
                let value = source.value.clone();
                rsx! {
                    label { key: "{source.value}", class: "flex items-center gap-2 text-sm text-slate-700",
                        input {
                            r#type: "checkbox",
                            checked: checked,
                            onchange: move |_| actions.filter_by_source(&value),
                        }
                        "{source.label}"
                    }
                }
            })}
        }
    }
}

fn render_products(
    cross: CrossFilter,
    products: &[ProductOption],
    state: &FilterState,
) -> Element {
    rsx! {
        fieldset { class: "space-y-1",
            legend { class: "text-xs font-medium text-slate-600", "Продукты" }
            {products.iter().map(|product| {
                let checked = state.products.contains(&product.value);
                let value = product.value.clone();
                rsx! {
                    label { key: "{product.value}", class: "flex items-center gap-2 text-sm text-slate-700",
                        input {
                            r#type: "checkbox",
                            checked: checked,
                            onchange: move |_| cross.filter_by_product(&value),
                        }
                        "{product.label}"
                        span { class: "text-xs text-slate-400", "{product.category}" }
                    }
                }
            })}
        }
    }
}

/// 自定义区间：两端都选好之后才写入筛选。
#[component]
fn DateRangePicker() -> Element {
    let actions = use_filters();
    let mut draft = use_signal(DateRangeDraft::default);
    let mut draft_error = use_signal(|| None::<String>);

    let (from_value, to_value, ready) = {
        let current = draft.read();
        (
            current.from().map(|d| d.date().to_string()).unwrap_or_default(),
            current.to().map(|d| d.date().to_string()).unwrap_or_default(),
            current.is_ready(),
        )
    };

    rsx! {
        div { class: "flex flex-wrap items-center gap-2 text-sm",
            input {
                class: "rounded border border-slate-300 px-2 py-1",
                r#type: "date",
                value: "{from_value}",
                oninput: move |evt: FormEvent| {
                    if let Some(day) = day_start(&evt.value()) {
                        let staged_to = draft.peek().to();
                        draft.write().select(Some(day), staged_to);
                    }
                },
            }
            span { class: "text-slate-400", "по" }
            input {
                class: "rounded border border-slate-300 px-2 py-1",
                r#type: "date",
                value: "{to_value}",
                oninput: move |evt: FormEvent| {
                    if let Some(day) = day_start(&evt.value()) {
                        draft.write().set_to(day);
                    }
                },
            }
            button {
                class: "rounded bg-slate-900 px-3 py-1 text-xs text-white disabled:opacity-40",
                disabled: !ready,
                onclick: move |_| {
                    let committed = draft.peek().commit();
                    match committed {
                        Ok(range) => {
                            actions.set_date_range(range);
                            draft.write().clear();
                            draft_error.set(None);
                        }
                        Err(err) => draft_error.set(Some(err.to_string())),
                    }
                },
                "Применить"
            }
            if let Some(err) = draft_error() {
                span { class: "text-xs text-red-500", "{err}" }
            }
        }
    }
}

fn day_start(value: &str) -> Option<OffsetDateTime> {
    parse_iso_date(value)
        .ok()
        .map(|date| DateRange::single_day(date).from())
}

fn format_range(range: &DateRange) -> String {
    let format = format_description!("[day].[month].[year]");
    let from = range.from().format(&format).unwrap_or_default();
    let to = range.to().format(&format).unwrap_or_default();
    if range.is_single_day() {
        from
    } else {
        format!("{from} – {to}")
    }
}
