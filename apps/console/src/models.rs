use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::state::{FilterState, Sentiment};

/// 每条迷你趋势线固定 7 个点，从旧到新。
pub const SPARKLINE_LEN: usize = 7;

pub type Sparkline = [f64; SPARKLINE_LEN];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub value: String,
    pub label: String,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePresetSchema {
    pub label: String,
    pub days: u32,
}

/// `GET /api/config` 响应体
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub sources: Vec<SourceOption>,
    #[serde(default)]
    pub products: Vec<ProductOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_presets: Option<Vec<DatePresetSchema>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSchema {
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersSchema {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// `POST /api/dashboard/overview` 请求体
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRequest {
    pub date_range: DateRangeSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FiltersSchema>,
}

impl OverviewRequest {
    /// 后端只识别日期范围、来源和产品。
    pub fn from_filters(filters: &FilterState) -> Self {
        Self {
            date_range: DateRangeSchema {
                from: filters.date_range.from(),
                to: filters.date_range.to(),
            },
            filters: Some(FiltersSchema {
                sources: filters.sources.iter().cloned().collect(),
                products: filters.products.iter().cloned().collect(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    #[default]
    Up,
    Down,
    Stable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSchema {
    pub direction: TrendDirection,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSchema {
    pub current: f64,
    #[serde(default)]
    pub percentage: Option<f64>,
    pub trend: TrendSchema,
    pub sparkline: Sparkline,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSchema {
    pub total_reviews: MetricSchema,
    pub positive_reviews: MetricSchema,
    pub neutral_reviews: MetricSchema,
    pub negative_reviews: MetricSchema,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentDynamicsSchema {
    pub date: String,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaSchema {
    #[serde(default)]
    pub date_range: Option<Value>,
    #[serde(default)]
    pub filters_applied: Option<FiltersSchema>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverviewResponse {
    #[serde(default)]
    pub meta: MetaSchema,
    pub metrics: MetricsSchema,
    #[serde(default)]
    pub sentiment_dynamics: Vec<SentimentDynamicsSchema>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrendData {
    pub total: Sparkline,
    pub positive: Sparkline,
    pub neutral: Sparkline,
    pub negative: Sparkline,
}

/// 仪表盘指标；默认值（全零）用作加载失败时的兜底。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardMetrics {
    pub total_reviews: f64,
    pub positive_reviews: f64,
    pub neutral_reviews: f64,
    pub negative_reviews: f64,
    pub positive_percentage: f64,
    pub neutral_percentage: f64,
    pub negative_percentage: f64,
    pub trend_data: TrendData,
}

impl From<&MetricsSchema> for DashboardMetrics {
    fn from(metrics: &MetricsSchema) -> Self {
        Self {
            total_reviews: metrics.total_reviews.current,
            positive_reviews: metrics.positive_reviews.current,
            neutral_reviews: metrics.neutral_reviews.current,
            negative_reviews: metrics.negative_reviews.current,
            positive_percentage: metrics.positive_reviews.percentage.unwrap_or_default(),
            neutral_percentage: metrics.neutral_reviews.percentage.unwrap_or_default(),
            negative_percentage: metrics.negative_reviews.percentage.unwrap_or_default(),
            trend_data: TrendData {
                total: metrics.total_reviews.sparkline,
                positive: metrics.positive_reviews.sparkline,
                neutral: metrics.neutral_reviews.sparkline,
                negative: metrics.negative_reviews.sparkline,
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SentimentPoint {
    pub date: String,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub topics: Vec<String>,
}

impl SentimentPoint {
    pub fn value(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

impl From<SentimentDynamicsSchema> for SentimentPoint {
    fn from(day: SentimentDynamicsSchema) -> Self {
        Self {
            date: day.date,
            positive: day.positive,
            neutral: day.neutral,
            negative: day.negative,
            topics: day.topics.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardOverview {
    pub metrics: DashboardMetrics,
    pub sentiment_dynamics: Vec<SentimentPoint>,
}

impl From<OverviewResponse> for DashboardOverview {
    fn from(response: OverviewResponse) -> Self {
        Self {
            metrics: DashboardMetrics::from(&response.metrics),
            sentiment_dynamics: response
                .sentiment_dynamics
                .into_iter()
                .map(SentimentPoint::from)
                .collect(),
        }
    }
}
