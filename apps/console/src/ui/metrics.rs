use dioxus::prelude::*;

use crate::hooks::filters::use_dashboard;
use crate::hooks::metrics::use_metrics;
use crate::models::TrendDirection;
use crate::trends::MetricView;

#[component]
pub fn MetricsPanel() -> Element {
    let view = use_metrics();
    let dashboard = use_dashboard();
    let filtered = dashboard.is_filtered();
    let active = dashboard.active_filters_count();
    let data = view.data;
    let metrics = view.metrics.read().clone();
    let loading = data.loading();
    let error = data.error();

    rsx! {
        section { class: "space-y-3",
            header { class: "flex items-center justify-between",
                h2 { class: "text-lg font-semibold text-slate-900", "Ключевые показатели" }
                if filtered {
                    span { class: "rounded-full bg-slate-100 px-2 py-0.5 text-xs text-slate-600",
                        "Активных фильтров: {active}"
                    }
                }
                if loading {
                    span { class: "text-xs text-slate-500", "Обновление..." }
                }
            }
            if let Some(err) = error {
                div { class: "flex items-center justify-between rounded bg-red-50 px-3 py-2",
                    p { class: "text-xs text-red-600", "{err}" }
                    button {
                        class: "text-xs text-red-700 underline",
                        onclick: move |_| data.refetch(),
                        "Повторить"
                    }
                }
            }
            div { class: "grid grid-cols-2 gap-3 md:grid-cols-4",
                {render_metric("Всего отзывов", &metrics.total_reviews)}
                {render_metric("Позитивные", &metrics.positive_reviews)}
                {render_metric("Нейтральные", &metrics.neutral_reviews)}
                {render_metric("Негативные", &metrics.negative_reviews)}
            }
        }
    }
}

fn render_metric(title: &str, metric: &MetricView) -> Element {
    let (arrow, tone) = match metric.trend.direction {
        TrendDirection::Up => ("▲", "text-green-600"),
        TrendDirection::Down => ("▼", "text-red-600"),
        TrendDirection::Stable => ("■", "text-slate-500"),
    };
    let value = format!("{:.0}", metric.value);
    let share = metric
        .percentage
        .map(|pct| format!("{pct:.1}%"))
        .unwrap_or_default();
    let change = format!("{arrow} {}%", metric.trend.change_percent);
    let peak = metric.trend_data.iter().copied().fold(0.0_f64, f64::max);

    rsx! {
        div { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
            p { class: "text-xs text-slate-500", "{title}" }
            p { class: "text-2xl font-bold text-slate-900", "{value}" }
            div { class: "flex items-center justify-between text-xs",
                span { class: "text-slate-500", "{share}" }
                span { class: tone, "{change}" }
            }
            div { class: "mt-2 flex h-8 items-end gap-1",
                for (idx, point) in metric.trend_data.iter().enumerate() {
                    div {
                        key: "{idx}",
                        class: "flex-1 rounded-sm bg-slate-300",
                        style: format!("height: {}%", bar_height(*point, peak)),
                    }
                }
            }
        }
    }
}

fn bar_height(point: f64, peak: f64) -> u32 {
    if peak <= 0.0 {
        return 0;
    }
    ((point / peak) * 100.0).round().clamp(0.0, 100.0) as u32
}
