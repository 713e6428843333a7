// Analyzer module: aggregation, join, gap metrics and risk classification.

pub mod aggregator;
pub mod classifier;
pub mod joiner;
pub mod metrics;
pub mod pipeline;

pub use pipeline::build_monitor_from_paths;
