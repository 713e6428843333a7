// Typed extraction of own prices and competitor observations from a loaded table
use crate::loader::table::Table;
use crate::model::{
    CompetitorObservation, MonitorError, OwnPriceRecord, OwnPrices, PriceKey, Result,
    DERIVED_COLUMN_NAMES,
};
use crate::utils::parse_price;
use csv::StringRecord;
use tracing::warn;

pub const OWN_TABLE: &str = "own_prices";
pub const COMPETITOR_TABLE: &str = "competitor_prices";

pub const KEY_COLUMNS: [&str; 3] = ["date", "store_id", "sku_id"];
pub const OWN_REQUIRED: [&str; 4] = ["date", "store_id", "sku_id", "own_price"];
pub const COMPETITOR_REQUIRED: [&str; 4] = ["date", "store_id", "sku_id", "comp_price"];

struct KeyIndex {
    date: usize,
    store_id: usize,
    sku_id: usize,
}

impl KeyIndex {
    fn resolve(table: &Table) -> Option<Self> {
        Some(Self {
            date: table.column_index("date")?,
            store_id: table.column_index("store_id")?,
            sku_id: table.column_index("sku_id")?,
        })
    }

    fn key(&self, row: &StringRecord) -> PriceKey {
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
        PriceKey::new(field(self.date), field(self.store_id), field(self.sku_id))
    }
}

fn price_at(
    table_name: &str,
    column: &str,
    row: &StringRecord,
    idx: usize,
    line: usize,
) -> Result<Option<f64>> {
    let raw = row.get(idx).unwrap_or("");
    parse_price(raw).ok_or_else(|| MonitorError::InvalidNumber {
        table: table_name.to_string(),
        column: column.to_string(),
        line,
        value: raw.to_string(),
    })
}

/// Own-price columns carried through to the monitor unchanged.
pub fn is_attribute(name: &str) -> bool {
    !OWN_REQUIRED.contains(&name) && !DERIVED_COLUMN_NAMES.contains(&name)
}

// +2: header is line 1 and records are 1-based.
fn line_of(row_idx: usize) -> usize {
    row_idx + 2
}

/// Validates the own-price schema and types every row. Non-key columns other than
/// `own_price` are carried as pass-through attributes in header order, except columns
/// named like a computed monitor column: those are dropped and the computed value wins.
pub fn parse_own_prices(table: &Table) -> Result<OwnPrices> {
    table.require_columns(OWN_TABLE, &OWN_REQUIRED)?;
    let keys = KeyIndex::resolve(table).ok_or_else(|| MonitorError::Schema {
        table: OWN_TABLE.to_string(),
        missing: KEY_COLUMNS.iter().map(|c| c.to_string()).collect(),
    })?;
    let price_idx = table.column_index("own_price").unwrap_or_default();

    let shadowed: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .filter(|h| DERIVED_COLUMN_NAMES.contains(h))
        .collect();
    if !shadowed.is_empty() {
        warn!("Own-price columns {:?} are replaced by computed values", shadowed);
    }

    let attribute_idx: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| is_attribute(h))
        .map(|(i, _)| i)
        .collect();
    let attribute_columns = attribute_idx.iter().map(|&i| table.headers[i].clone()).collect();

    let mut records = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let own_price = price_at(OWN_TABLE, "own_price", row, price_idx, line_of(i))?;
        records.push(OwnPriceRecord {
            key: keys.key(row),
            own_price,
            attributes: attribute_idx
                .iter()
                .map(|&idx| row.get(idx).unwrap_or("").to_string())
                .collect(),
        });
    }

    Ok(OwnPrices {
        header: table.headers.clone(),
        attribute_columns,
        records,
    })
}

/// Validates the competitor schema and types every row. Rows with a blank price carry no
/// observation and are skipped.
pub fn parse_competitor_observations(table: &Table) -> Result<Vec<CompetitorObservation>> {
    table.require_columns(COMPETITOR_TABLE, &COMPETITOR_REQUIRED)?;
    let keys = KeyIndex::resolve(table).ok_or_else(|| MonitorError::Schema {
        table: COMPETITOR_TABLE.to_string(),
        missing: KEY_COLUMNS.iter().map(|c| c.to_string()).collect(),
    })?;
    let price_idx = table.column_index("comp_price").unwrap_or_default();
    let competitor_idx = table.column_index("competitor");

    let mut observations = Vec::with_capacity(table.rows.len());
    let mut blank = 0usize;
    for (i, row) in table.rows.iter().enumerate() {
        let comp_price = price_at(COMPETITOR_TABLE, "comp_price", row, price_idx, line_of(i))?;
        let Some(comp_price) = comp_price else {
            blank += 1;
            continue;
        };
        observations.push(CompetitorObservation {
            key: keys.key(row),
            competitor: competitor_idx
                .and_then(|idx| row.get(idx))
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            comp_price,
        });
    }

    if blank > 0 {
        warn!("Skipped {} competitor rows with blank comp_price", blank);
    }
    Ok(observations)
}
