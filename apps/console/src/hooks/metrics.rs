use dioxus::prelude::*;

use crate::hooks::dashboard::{use_dashboard_data, DashboardData};
use crate::trends::EnhancedMetrics;

#[derive(Clone, Copy, PartialEq)]
pub struct MetricsView {
    pub metrics: Memo<EnhancedMetrics>,
    pub data: DashboardData,
}

/// 概览指标加上基于七日走势的趋势。
pub fn use_metrics() -> MetricsView {
    let data = use_dashboard_data();
    let metrics = use_memo(move || EnhancedMetrics::from(&data.state.read().overview.metrics));

    MetricsView { metrics, data }
}
