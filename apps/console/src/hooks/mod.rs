pub mod config;
pub mod dashboard;
pub mod filters;
pub mod metrics;
pub mod search;
pub mod sentiment;
