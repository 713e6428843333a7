use crate::model::{CompetitorSummary, JoinedRow, MonitorError, OwnPriceRecord, PriceKey, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Left-joins own-price records with competitor summaries on the composite key.
/// Own rows keep their input order; summaries without an own row are dropped.
/// Fails with `DuplicateKey` when the own side repeats a key.
pub fn join(own: &[OwnPriceRecord], summaries: &[CompetitorSummary]) -> Result<Vec<JoinedRow>> {
    let by_key: HashMap<&PriceKey, &CompetitorSummary> =
        summaries.iter().map(|s| (&s.key, s)).collect();

    let mut seen: HashSet<&PriceKey> = HashSet::with_capacity(own.len());
    let mut joined = Vec::with_capacity(own.len());
    for record in own {
        if !seen.insert(&record.key) {
            return Err(MonitorError::DuplicateKey(record.key.clone()));
        }
        joined.push(JoinedRow {
            record: record.clone(),
            summary: by_key.get(&record.key).map(|s| (*s).clone()),
        });
    }

    let matched = joined.iter().filter(|r| r.summary.is_some()).count();
    debug!(
        "Joined {} own rows: {} matched, {} competitor keys dropped",
        joined.len(),
        matched,
        summaries.len() - matched
    );
    Ok(joined)
}
