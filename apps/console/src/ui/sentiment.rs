//! 情绪动态面板
//!
//! 按日展示正面、中性、负面占比；点击日期收窄区间，点击情绪切换筛选，
//! 下钻按钮同时收窄日期与情绪并展示当日热门话题。

use dioxus::prelude::*;
use tracing::warn;

use crate::hooks::sentiment::{use_sentiment_dynamics, SentimentDynamics};
use crate::models::{SentimentPoint, TrendDirection};
use crate::state::Sentiment;
use crate::trends::{DrillDown, SentimentTrend};

fn sentiment_label(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "Позитивные",
        Sentiment::Neutral => "Нейтральные",
        Sentiment::Negative => "Негативные",
    }
}

fn trend_caption(trend: &SentimentTrend) -> String {
    match trend.direction {
        TrendDirection::Up => format!("▲ {:+.1}", trend.change),
        TrendDirection::Down => format!("▼ {:+.1}", trend.change),
        TrendDirection::Stable => "без изменений".to_string(),
    }
}

#[component]
pub fn SentimentDynamicsPanel() -> Element {
    let dynamics = use_sentiment_dynamics();
    let mut drill = use_signal(|| None::<DrillDown>);

    let points = dynamics.points();
    let totals = dynamics.aggregated();
    let trends = dynamics.trends();
    let active = dynamics.active_sentiments();

    let chips = Sentiment::ALL.into_iter().map(|sentiment| {
        let selected = active.contains(&sentiment);
        let class = if selected {
            "rounded-full bg-slate-900 px-3 py-1 text-xs text-white"
        } else {
            "rounded-full bg-slate-100 px-3 py-1 text-xs text-slate-700"
        };
        let average = match sentiment {
            Sentiment::Positive => totals.averages.positive,
            Sentiment::Neutral => totals.averages.neutral,
            Sentiment::Negative => totals.averages.negative,
        };
        let caption = format!(
            "{}: в среднем {average}, {}",
            sentiment_label(sentiment),
            trend_caption(trends.get(sentiment))
        );
        rsx! {
            button {
                key: "{sentiment}",
                class: class,
                onclick: move |_| dynamics.handle_sentiment_click(sentiment),
                "{caption}"
            }
        }
    });

    let total = format!("{:.0}", totals.total);
    let rows = points.iter().map(|point| render_row(point, dynamics, drill));

    rsx! {
        section { class: "space-y-3 rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
            header { class: "flex flex-col gap-1",
                h2 { class: "text-lg font-semibold text-slate-900", "Динамика тональности" }
                p { class: "text-xs text-slate-500", "Всего упоминаний за период: {total}" }
            }
            div { class: "flex flex-wrap gap-2", {chips} }
            if points.is_empty() {
                p { class: "text-xs italic text-slate-500", "Нет данных за выбранный период" }
            } else {
                table { class: "w-full text-sm",
                    thead {
                        tr { class: "text-left text-xs text-slate-500",
                            th { "Дата" }
                            th { "Позитив" }
                            th { "Нейтрал" }
                            th { "Негатив" }
                            th {}
                        }
                    }
                    tbody { {rows} }
                }
            }
            if let Some(target) = drill() {
                div { class: "rounded border border-slate-100 bg-slate-50 p-3",
                    h3 { class: "text-sm font-medium text-slate-800", "Темы за {target.date}" }
                    if target.topics.is_empty() {
                        p { class: "text-xs text-slate-500", "Темы не найдены" }
                    } else {
                        ul { class: "list-disc pl-5 text-xs text-slate-700",
                            for topic in target.topics.iter() {
                                li { key: "{topic}", "{topic}" }
                            }
                        }
                    }
                    button {
                        class: "mt-2 text-xs text-slate-500 underline",
                        onclick: move |_| drill.set(None),
                        "Скрыть"
                    }
                }
            }
        }
    }
}

fn render_row(
    point: &SentimentPoint,
    dynamics: SentimentDynamics,
    drill: Signal<Option<DrillDown>>,
) -> Element {
    let date = point.date.clone();
    let cells = Sentiment::ALL
        .into_iter()
        .map(|sentiment| render_cell(point, sentiment, dynamics, drill));

    rsx! {
        tr { key: "{point.date}", class: "border-t border-slate-100",
            td {
                button {
                    class: "text-slate-700 hover:underline",
                    onclick: move |_| {
                        if let Err(err) = dynamics.handle_date_click(&date) {
                            warn!(%err, "ignoring click on malformed date");
                        }
                    },
                    "{point.date}"
                }
            }
            {cells}
            td {
                {drill_button(point.date.clone(), None, "Подробнее", dynamics, drill)}
            }
        }
    }
}

fn render_cell(
    point: &SentimentPoint,
    sentiment: Sentiment,
    dynamics: SentimentDynamics,
    drill: Signal<Option<DrillDown>>,
) -> Element {
    let tone = match sentiment {
        Sentiment::Positive => "text-green-600",
        Sentiment::Neutral => "text-slate-600",
        Sentiment::Negative => "text-red-600",
    };
    let value = format!("{:.1}", point.value(sentiment));

    rsx! {
        td { key: "{sentiment}", class: tone,
            {drill_button(point.date.clone(), Some(sentiment), &value, dynamics, drill)}
        }
    }
}

fn drill_button(
    date: String,
    sentiment: Option<Sentiment>,
    label: &str,
    dynamics: SentimentDynamics,
    mut drill: Signal<Option<DrillDown>>,
) -> Element {
    rsx! {
        button {
            class: "hover:underline",
            onclick: move |_| match dynamics.handle_drill_down(&date, sentiment) {
                Ok(target) => drill.set(Some(target)),
                Err(err) => warn!(%err, "drill down rejected"),
            },
            "{label}"
        }
    }
}
