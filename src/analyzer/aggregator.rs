use crate::loader::{parse_competitor_observations, Table};
use crate::model::{CompetitorObservation, CompetitorSummary, PriceKey, Result};
use std::collections::HashMap;
use tracing::debug;

/// Validates and types a competitor table, then aggregates it.
pub fn aggregate_table(table: &Table) -> Result<Vec<CompetitorSummary>> {
    let observations = parse_competitor_observations(table)?;
    Ok(aggregate(&observations))
}

/// Reduces observations to one summary per key, in first-appearance order.
pub fn aggregate(observations: &[CompetitorObservation]) -> Vec<CompetitorSummary> {
    let mut slots: HashMap<&PriceKey, usize> = HashMap::new();
    let mut groups: Vec<(&PriceKey, Vec<f64>)> = Vec::new();

    for obs in observations {
        let slot = *slots.entry(&obs.key).or_insert_with(|| {
            groups.push((&obs.key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(obs.comp_price);
    }

    let summaries: Vec<CompetitorSummary> = groups
        .into_iter()
        .map(|(key, prices)| summarize(key.clone(), &prices))
        .collect();
    debug!(
        "Aggregated {} competitor observations into {} keys",
        observations.len(),
        summaries.len()
    );
    summaries
}

fn summarize(key: PriceKey, prices: &[f64]) -> CompetitorSummary {
    let count = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / count;
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    CompetitorSummary {
        key,
        comp_price_mean: mean,
        comp_price_min: min,
        comp_price_max: max,
        comp_price_std: sample_std_dev(prices, mean),
        comp_n_obs: prices.len(),
    }
}

/// Sample standard deviation (n - 1); 0.0 when fewer than two prices.
fn sample_std_dev(prices: &[f64], mean: f64) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let variance = prices
        .iter()
        .map(|p| (p - mean).powi(2))
        .sum::<f64>() / (prices.len() as f64 - 1.0);
    variance.sqrt()
}
