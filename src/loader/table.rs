use crate::model::{MonitorError, Result};
use crate::normalizer::normalize_headers;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Untyped tabular data: header names plus text rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Reads a CSV file into a `Table`. Fails with `NotFound` when the file does not exist.
pub fn load(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(MonitorError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let table = Table::from_reader(file)?;
    debug!(
        "Loaded {}: {} rows, {} columns",
        path.display(),
        table.rows.len(),
        table.headers.len()
    );
    Ok(table)
}

impl Table {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = normalize_headers(reader.headers()?);
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fails with `Schema` listing every absent column, sorted.
    pub fn require_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let missing: BTreeSet<&str> = required
            .iter()
            .copied()
            .filter(|c| self.column_index(c).is_none())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(MonitorError::Schema {
            table: table.to_string(),
            missing: missing.into_iter().map(str::to_string).collect(),
        })
    }
}
