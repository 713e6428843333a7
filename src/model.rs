// Core structs: price records, competitor summaries, monitor rows
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Composite key identifying a product-store-day observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey {
    pub date: String,
    pub store_id: String,
    pub sku_id: String,
}

impl PriceKey {
    pub fn new(
        date: impl Into<String>,
        store_id: impl Into<String>,
        sku_id: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            store_id: store_id.into(),
            sku_id: sku_id.into(),
        }
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.date, self.store_id, self.sku_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnPriceRecord {
    pub key: PriceKey,
    pub own_price: Option<f64>,
    /// Values of the pass-through columns, aligned with `OwnPrices::attribute_columns`.
    pub attributes: Vec<String>,
}

/// Own-price input after typing: the header as read plus one record per row.
#[derive(Debug, Clone, Default)]
pub struct OwnPrices {
    pub header: Vec<String>,
    pub attribute_columns: Vec<String>,
    pub records: Vec<OwnPriceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorObservation {
    pub key: PriceKey,
    pub competitor: Option<String>,
    pub comp_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorSummary {
    pub key: PriceKey,
    pub comp_price_mean: f64,
    pub comp_price_min: f64,
    pub comp_price_max: f64,
    pub comp_price_std: f64,
    pub comp_n_obs: usize,
}

/// Own-price record left-joined with its competitor summary, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub record: OwnPriceRecord,
    pub summary: Option<CompetitorSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GapMetrics {
    pub gap_abs_vs_mean: Option<f64>,
    pub gap_pct_vs_mean: Option<f64>,
    pub comp_range: Option<f64>,
    pub comp_range_pct: Option<f64>,
    pub comp_cv: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskLabel {
    AltoRisco,
    AbaixoMercado,
    Alinhado,
    SemDado,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::AltoRisco => "ALTO_RISCO",
            RiskLabel::AbaixoMercado => "ABAIXO_MERCADO",
            RiskLabel::Alinhado => "ALINHADO",
            RiskLabel::SemDado => "SEM_DADO",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRow {
    pub record: OwnPriceRecord,
    pub summary: Option<CompetitorSummary>,
    pub metrics: GapMetrics,
    pub risk_label: RiskLabel,
}

/// A column of the monitor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorColumn {
    Date,
    StoreId,
    SkuId,
    OwnPrice,
    /// Pass-through own-price column, by index into `MonitorTable::attribute_columns`.
    Attribute(usize),
    CompPriceMean,
    CompPriceMin,
    CompPriceMax,
    CompPriceStd,
    CompNObs,
    GapAbsVsMean,
    GapPctVsMean,
    CompRange,
    CompRangePct,
    CompCv,
    RiskLabel,
}

/// Names of the columns computed from competitor data, in natural output order.
pub const DERIVED_COLUMN_NAMES: [&str; 11] = [
    "comp_price_mean",
    "comp_price_min",
    "comp_price_max",
    "comp_price_std",
    "comp_n_obs",
    "gap_abs_vs_mean",
    "gap_pct_vs_mean",
    "comp_range",
    "comp_range_pct",
    "comp_cv",
    "risk_label",
];

/// SQL storage class of a monitor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Real,
    Integer,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Real => "REAL",
            ColumnKind::Integer => "INTEGER",
        }
    }
}

impl MonitorColumn {
    pub fn name<'a>(&self, attribute_columns: &'a [String]) -> &'a str {
        match self {
            MonitorColumn::Date => "date",
            MonitorColumn::StoreId => "store_id",
            MonitorColumn::SkuId => "sku_id",
            MonitorColumn::OwnPrice => "own_price",
            MonitorColumn::Attribute(idx) => attribute_columns
                .get(*idx)
                .map(String::as_str)
                .unwrap_or(""),
            MonitorColumn::CompPriceMean => "comp_price_mean",
            MonitorColumn::CompPriceMin => "comp_price_min",
            MonitorColumn::CompPriceMax => "comp_price_max",
            MonitorColumn::CompPriceStd => "comp_price_std",
            MonitorColumn::CompNObs => "comp_n_obs",
            MonitorColumn::GapAbsVsMean => "gap_abs_vs_mean",
            MonitorColumn::GapPctVsMean => "gap_pct_vs_mean",
            MonitorColumn::CompRange => "comp_range",
            MonitorColumn::CompRangePct => "comp_range_pct",
            MonitorColumn::CompCv => "comp_cv",
            MonitorColumn::RiskLabel => "risk_label",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            MonitorColumn::Date
            | MonitorColumn::StoreId
            | MonitorColumn::SkuId
            | MonitorColumn::Attribute(_)
            | MonitorColumn::RiskLabel => ColumnKind::Text,
            MonitorColumn::CompNObs => ColumnKind::Integer,
            _ => ColumnKind::Real,
        }
    }
}

/// A single output value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Real(f64),
    Integer(i64),
    Missing,
}

impl<'a> Cell<'a> {
    fn from_option(value: Option<f64>) -> Self {
        value.map(Cell::Real).unwrap_or(Cell::Missing)
    }

    fn from_text(value: &'a str) -> Self {
        if value.is_empty() { Cell::Missing } else { Cell::Text(value) }
    }
}

impl MonitorRow {
    pub fn cell(&self, column: MonitorColumn) -> Cell<'_> {
        let summary = self.summary.as_ref();
        match column {
            MonitorColumn::Date => Cell::Text(&self.record.key.date),
            MonitorColumn::StoreId => Cell::Text(&self.record.key.store_id),
            MonitorColumn::SkuId => Cell::Text(&self.record.key.sku_id),
            MonitorColumn::OwnPrice => Cell::from_option(self.record.own_price),
            MonitorColumn::Attribute(idx) => self
                .record
                .attributes
                .get(idx)
                .map(|v| Cell::from_text(v))
                .unwrap_or(Cell::Missing),
            MonitorColumn::CompPriceMean => Cell::from_option(summary.map(|s| s.comp_price_mean)),
            MonitorColumn::CompPriceMin => Cell::from_option(summary.map(|s| s.comp_price_min)),
            MonitorColumn::CompPriceMax => Cell::from_option(summary.map(|s| s.comp_price_max)),
            MonitorColumn::CompPriceStd => Cell::from_option(summary.map(|s| s.comp_price_std)),
            MonitorColumn::CompNObs => summary
                .map(|s| Cell::Integer(s.comp_n_obs as i64))
                .unwrap_or(Cell::Missing),
            MonitorColumn::GapAbsVsMean => Cell::from_option(self.metrics.gap_abs_vs_mean),
            MonitorColumn::GapPctVsMean => Cell::from_option(self.metrics.gap_pct_vs_mean),
            MonitorColumn::CompRange => Cell::from_option(self.metrics.comp_range),
            MonitorColumn::CompRangePct => Cell::from_option(self.metrics.comp_range_pct),
            MonitorColumn::CompCv => Cell::from_option(self.metrics.comp_cv),
            MonitorColumn::RiskLabel => Cell::Text(self.risk_label.as_str()),
        }
    }
}

/// Final monitor output: ordered columns plus one row per own-price key.
#[derive(Debug, Clone, Default)]
pub struct MonitorTable {
    pub columns: Vec<MonitorColumn>,
    pub attribute_columns: Vec<String>,
    pub rows: Vec<MonitorRow>,
}

impl MonitorTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.name(&self.attribute_columns))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn find(&self, key: &PriceKey) -> Option<&MonitorRow> {
        self.rows.iter().find(|r| &r.record.key == key)
    }

    /// Row count per risk label, sorted by label text.
    pub fn risk_counts(&self) -> Vec<(RiskLabel, usize)> {
        let mut counts: Vec<(RiskLabel, usize)> = Vec::new();
        for row in &self.rows {
            match counts.iter_mut().find(|(label, _)| *label == row.risk_label) {
                Some((_, n)) => *n += 1,
                None => counts.push((row.risk_label, 1)),
            }
        }
        counts.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        counts
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{table} missing columns: {missing:?}")]
    Schema { table: String, missing: Vec<String> },

    #[error("{table} line {line}: column `{column}` is not a number: {value:?}")]
    InvalidNumber {
        table: String,
        column: String,
        line: usize,
        value: String,
    },

    #[error("own prices repeat key {0}")]
    DuplicateKey(PriceKey),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
