use dioxus::prelude::*;
use tracing::debug;

use crate::hooks::dashboard::{use_dashboard_data, DashboardData};
use crate::hooks::filters::{use_cross_filter, use_filters, CrossFilter, FilterActions};
use crate::models::SentimentPoint;
use crate::state::{parse_iso_date, DateRange, FilterError, Sentiment};
use crate::trends::{DrillDown, SentimentTotals, SentimentTrends};

#[derive(Clone, Copy, PartialEq)]
pub struct SentimentDynamics {
    pub data: DashboardData,
    actions: FilterActions,
    cross: CrossFilter,
}

impl SentimentDynamics {
    pub fn points(&self) -> Vec<SentimentPoint> {
        self.data.state.read().overview.sentiment_dynamics.clone()
    }

    pub fn aggregated(&self) -> SentimentTotals {
        SentimentTotals::aggregate(&self.data.state.read().overview.sentiment_dynamics)
    }

    pub fn trends(&self) -> SentimentTrends {
        SentimentTrends::compute(&self.data.state.read().overview.sentiment_dynamics)
    }

    pub fn active_sentiments(&self) -> Vec<Sentiment> {
        self.cross.current_filters().sentiments.into_iter().collect()
    }

    /// 点击某一天：日期范围收窄到这一天。
    pub fn handle_date_click(&self, date: &str) -> Result<(), FilterError> {
        let day = parse_iso_date(date)?;
        self.actions.set_date_range(DateRange::single_day(day));
        Ok(())
    }

    pub fn handle_sentiment_click(&self, sentiment: Sentiment) {
        self.cross.filter_by_sentiment(sentiment);
    }

    /// 下钻到某一天（可带情绪），返回该日的热门话题供调用方展示。
    pub fn handle_drill_down(
        &self,
        date: &str,
        sentiment: Option<Sentiment>,
    ) -> Result<DrillDown, FilterError> {
        let target = {
            let snapshot = self.data.state.peek();
            DrillDown::resolve(&snapshot.overview.sentiment_dynamics, date, sentiment)?
        };
        debug!(date, ?sentiment, topics = target.topics.len(), "drill down");
        self.actions.drill_down(target.date, target.sentiment);
        Ok(target)
    }
}

pub fn use_sentiment_dynamics() -> SentimentDynamics {
    SentimentDynamics {
        data: use_dashboard_data(),
        actions: use_filters(),
        cross: use_cross_filter(),
    }
}
