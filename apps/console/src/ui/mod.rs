pub mod filters;
pub mod metrics;
pub mod sentiment;
