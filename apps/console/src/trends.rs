use serde::Serialize;
use time::Date;

use crate::models::{DashboardMetrics, SentimentPoint, Sparkline, TrendDirection};
use crate::state::{parse_iso_date, FilterError, Sentiment};

/// 情绪趋势的噪声死区：首尾差值在 ±2 以内视为平稳。
pub const SENTIMENT_TREND_DEADBAND: f64 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MetricTrend {
    pub direction: TrendDirection,
    pub change: f64,
    pub change_percent: i64,
}

impl MetricTrend {
    /// 比较首尾两点；不足两点时返回 `up / 0 / 0`。
    pub fn from_sparkline(points: &[f64]) -> Self {
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return Self::default();
        };
        if points.len() < 2 {
            return Self::default();
        }

        let change = last - first;
        Self {
            direction: if change >= 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            },
            change,
            change_percent: percent_of(change, first),
        }
    }
}

fn percent_of(change: f64, base: f64) -> i64 {
    if base == 0.0 {
        return 0;
    }
    ((change / base).abs() * 100.0).round() as i64
}

/// 带符号的变化百分比，下降为负。
fn signed_percent_of(change: f64, base: f64) -> i64 {
    if base == 0.0 {
        return 0;
    }
    ((change / base) * 100.0).round() as i64
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricView {
    pub value: f64,
    pub percentage: Option<f64>,
    pub trend: MetricTrend,
    pub trend_data: Sparkline,
}

impl MetricView {
    fn new(value: f64, percentage: Option<f64>, trend_data: Sparkline) -> Self {
        Self {
            value,
            percentage,
            trend: MetricTrend::from_sparkline(&trend_data),
            trend_data,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnhancedMetrics {
    pub total_reviews: MetricView,
    pub positive_reviews: MetricView,
    pub neutral_reviews: MetricView,
    pub negative_reviews: MetricView,
}

impl From<&DashboardMetrics> for EnhancedMetrics {
    fn from(metrics: &DashboardMetrics) -> Self {
        let trend = &metrics.trend_data;
        Self {
            total_reviews: MetricView::new(metrics.total_reviews, None, trend.total),
            positive_reviews: MetricView::new(
                metrics.positive_reviews,
                Some(metrics.positive_percentage),
                trend.positive,
            ),
            neutral_reviews: MetricView::new(
                metrics.neutral_reviews,
                Some(metrics.neutral_percentage),
                trend.neutral,
            ),
            negative_reviews: MetricView::new(
                metrics.negative_reviews,
                Some(metrics.negative_percentage),
                trend.negative,
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SentimentAverages {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SentimentTotals {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub total: f64,
    pub averages: SentimentAverages,
}

impl SentimentTotals {
    pub fn aggregate(points: &[SentimentPoint]) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let (positive, neutral, negative) =
            points.iter().fold((0.0, 0.0, 0.0), |(pos, neu, neg), day| {
                (pos + day.positive, neu + day.neutral, neg + day.negative)
            });
        let count = points.len() as f64;

        Self {
            positive,
            neutral,
            negative,
            total: positive + neutral + negative,
            averages: SentimentAverages {
                positive: (positive / count).round() as i64,
                neutral: (neutral / count).round() as i64,
                negative: (negative / count).round() as i64,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SentimentTrend {
    pub direction: TrendDirection,
    pub change: f64,
    pub change_percent: i64,
}

impl Default for SentimentTrend {
    fn default() -> Self {
        Self {
            direction: TrendDirection::Stable,
            change: 0.0,
            change_percent: 0,
        }
    }
}

impl SentimentTrend {
    pub fn for_sentiment(points: &[SentimentPoint], sentiment: Sentiment) -> Self {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Self::default();
        };
        if points.len() < 2 {
            return Self::default();
        }

        let base = first.value(sentiment);
        let change = last.value(sentiment) - base;
        let direction = if change > SENTIMENT_TREND_DEADBAND {
            TrendDirection::Up
        } else if change < -SENTIMENT_TREND_DEADBAND {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        Self {
            direction,
            change,
            change_percent: signed_percent_of(change, base),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SentimentTrends {
    pub positive: SentimentTrend,
    pub neutral: SentimentTrend,
    pub negative: SentimentTrend,
}

impl SentimentTrends {
    pub fn compute(points: &[SentimentPoint]) -> Self {
        Self {
            positive: SentimentTrend::for_sentiment(points, Sentiment::Positive),
            neutral: SentimentTrend::for_sentiment(points, Sentiment::Neutral),
            negative: SentimentTrend::for_sentiment(points, Sentiment::Negative),
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> &SentimentTrend {
        match sentiment {
            Sentiment::Positive => &self.positive,
            Sentiment::Neutral => &self.neutral,
            Sentiment::Negative => &self.negative,
        }
    }
}

/// 下钻目标：选中的日期、可选情绪以及该日的热门话题。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrillDown {
    pub date: Date,
    pub sentiment: Option<Sentiment>,
    pub topics: Vec<String>,
}

impl DrillDown {
    pub fn resolve(
        points: &[SentimentPoint],
        date: &str,
        sentiment: Option<Sentiment>,
    ) -> Result<Self, FilterError> {
        let parsed = parse_iso_date(date)?;
        let topics = points
            .iter()
            .find(|point| point.date == date)
            .map(|point| point.topics.clone())
            .unwrap_or_default();

        Ok(Self {
            date: parsed,
            sentiment,
            topics,
        })
    }
}
