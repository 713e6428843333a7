use crate::analyzer::aggregator::aggregate_table;
use crate::analyzer::joiner::join;
use crate::analyzer::metrics::compute_metrics;
use crate::config::RiskThresholds;
use crate::loader::{load, parse_own_prices, Table};
use crate::model::{MonitorTable, Result};
use std::path::Path;
use tracing::info;

/// Builds the monitor from two loaded tables: own prices and competitor observations.
/// Either the full table is returned or the first error; nothing partial.
pub fn build_monitor(
    own: &Table,
    competitors: &Table,
    thresholds: &RiskThresholds,
) -> Result<MonitorTable> {
    let own = parse_own_prices(own)?;
    let summaries = aggregate_table(competitors)?;
    info!(
        "Own rows: {} | Competitor keys: {}",
        own.records.len(),
        summaries.len()
    );

    let joined = join(&own.records, &summaries)?;
    let table = compute_metrics(joined, &own.header, &own.attribute_columns, thresholds);
    info!("Monitor built: {} rows, {} columns", table.len(), table.columns.len());
    Ok(table)
}

/// Loads both CSV inputs, then builds the monitor.
pub fn build_monitor_from_paths(
    own_path: &Path,
    competitor_path: &Path,
    thresholds: &RiskThresholds,
) -> Result<MonitorTable> {
    let own = load(own_path)?;
    let competitors = load(competitor_path)?;
    build_monitor(&own, &competitors, thresholds)
}
