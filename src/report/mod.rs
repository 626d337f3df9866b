pub mod analytics;
pub mod generator;

pub use analytics::AnalyticsAggregator;
pub use generator::{generate_report, write_report};
