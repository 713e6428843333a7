use crate::model::{Cell, MonitorTable, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::path::Path;
use tracing::info;

pub const MONITOR_TABLE: &str = "monitor";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file, creating missing parent directories.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replaces the `monitor` table with the given rows, one typed column per output column.
    /// Runs in a single transaction.
    pub fn replace_monitor(&mut self, table: &MonitorTable) -> Result<()> {
        let names = table.column_names();
        let column_defs = table
            .columns
            .iter()
            .zip(&names)
            .map(|(c, name)| format!("{} {}", quote_ident(name), c.kind().sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({column_defs});",
            table = MONITOR_TABLE,
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                MONITOR_TABLE, placeholders
            ))?;
            for row in &table.rows {
                stmt.execute(params_from_iter(
                    table.columns.iter().map(|&c| to_value(row.cell(c))),
                ))?;
            }
        }
        tx.commit()?;

        info!("Stored {} monitor rows in SQLite", table.len());
        Ok(())
    }

    pub fn row_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", MONITOR_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Row count per risk label, ordered by label.
    pub fn risk_summary(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT risk_label, COUNT(*) FROM {} GROUP BY risk_label ORDER BY risk_label ASC",
            MONITOR_TABLE
        ))?;

        let rows = stmt.query_map([], |row| {
            let label: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((label, count as usize))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_value(cell: Cell<'_>) -> Value {
    match cell {
        Cell::Text(s) => Value::Text(s.to_string()),
        Cell::Real(v) => Value::Real(v),
        Cell::Integer(v) => Value::Integer(v),
        Cell::Missing => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::pipeline::build_monitor;
    use crate::config::RiskThresholds;
    use crate::loader::Table;
    use crate::storage::write_csv;

    fn monitor() -> MonitorTable {
        let own = Table::from_reader(
            "date,store_id,sku_id,own_price,cluster\n\
             2026-01-01,1,10,10.0,A\n\
             2026-01-01,1,20,25.0,B\n\
             2026-01-01,1,30,4.0,A\n"
                .as_bytes(),
        )
        .unwrap();
        let comp = Table::from_reader(
            "date,store_id,sku_id,comp_price\n\
             2026-01-01,1,10,9.0\n\
             2026-01-01,1,10,11.0\n\
             2026-01-01,1,20,20.0\n"
                .as_bytes(),
        )
        .unwrap();
        build_monitor(&own, &comp, &RiskThresholds::default()).unwrap()
    }

    #[test]
    fn stores_same_rows_as_table() {
        let table = monitor();
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.replace_monitor(&table).unwrap();

        assert_eq!(storage.row_count().unwrap(), table.len());
        let expected: Vec<(String, usize)> = table
            .risk_counts()
            .into_iter()
            .map(|(label, n)| (label.as_str().to_string(), n))
            .collect();
        assert_eq!(storage.risk_summary().unwrap(), expected);
    }

    #[test]
    fn missing_values_are_null_and_types_kept() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.replace_monitor(&monitor()).unwrap();

        let (mean, n_obs): (Option<f64>, Option<i64>) = storage
            .conn
            .query_row(
                "SELECT comp_price_mean, comp_n_obs FROM monitor WHERE sku_id = '30'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((mean, n_obs), (None, None));

        let (mean, n_obs): (f64, i64) = storage
            .conn
            .query_row(
                "SELECT comp_price_mean, comp_n_obs FROM monitor WHERE sku_id = '10'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((mean, n_obs), (10.0, 2));
    }

    #[test]
    fn replacing_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("monitor.db");
        let mut storage = SqliteStorage::new(&path).unwrap();
        storage.replace_monitor(&monitor()).unwrap();
        storage.replace_monitor(&monitor()).unwrap();
        assert_eq!(storage.row_count().unwrap(), 3);
    }

    fn stored_rows_as_text(storage: &SqliteStorage) -> Vec<Vec<String>> {
        let mut stmt = storage
            .conn
            .prepare("SELECT * FROM monitor ORDER BY rowid")
            .unwrap();
        let width = stmt.column_count();
        let rows = stmt.query_map([], |row| {
            (0..width)
                .map(|i| {
                    Ok(match row.get::<_, Value>(i)? {
                        Value::Null => String::new(),
                        Value::Integer(v) => v.to_string(),
                        Value::Real(v) => v.to_string(),
                        Value::Text(s) => s,
                        Value::Blob(_) => "<blob>".to_string(),
                    })
                })
                .collect::<rusqlite::Result<Vec<String>>>()
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();
        rows
    }

    #[test]
    fn csv_and_sqlite_hold_identical_cells() {
        let table = monitor();
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("monitor.csv");
        write_csv(&table, &csv_path).unwrap();
        let mut storage = SqliteStorage::new(&dir.path().join("monitor.db")).unwrap();
        storage.replace_monitor(&table).unwrap();

        let csv_table = crate::loader::load(&csv_path).unwrap();
        let stored_names: Vec<String> = storage
            .conn
            .prepare("SELECT * FROM monitor")
            .unwrap()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(csv_table.headers, stored_names);

        let csv_rows: Vec<Vec<String>> = csv_table
            .rows
            .iter()
            .map(|r| r.iter().map(str::to_string).collect())
            .collect();
        let stored = stored_rows_as_text(&storage);
        assert_eq!(csv_rows, stored);
        assert_eq!(stored.len(), 3);

        let col = |name: &str| csv_table.column_index(name).unwrap();
        let matched = &stored[0];
        assert_eq!(matched[col("cluster")], "A");
        assert_eq!(matched[col("comp_price_mean")], "10");
        assert_eq!(matched[col("comp_n_obs")], "2");
        let unmatched = &stored[2];
        assert_eq!(unmatched[col("sku_id")], "30");
        assert_eq!(unmatched[col("comp_price_mean")], "");
        assert_eq!(unmatched[col("gap_pct_vs_mean")], "");
        assert_eq!(unmatched[col("risk_label")], "SEM_DADO");
    }

    #[test]
    fn own_column_named_like_computed_one_is_stored_once() {
        let own = Table::from_reader(
            "date,store_id,sku_id,own_price,comp_range\n2026-01-01,1,10,10.0,99\n".as_bytes(),
        )
        .unwrap();
        let comp = Table::from_reader(
            "date,store_id,sku_id,comp_price\n2026-01-01,1,10,9.0\n2026-01-01,1,10,11.0\n"
                .as_bytes(),
        )
        .unwrap();
        let table = build_monitor(&own, &comp, &RiskThresholds::default()).unwrap();
        let names = table.column_names();
        assert_eq!(names.iter().filter(|n| **n == "comp_range").count(), 1);

        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.replace_monitor(&table).unwrap();
        let range: f64 = storage
            .conn
            .query_row("SELECT comp_range FROM monitor", [], |row| row.get(0))
            .unwrap();
        assert_eq!(range, 2.0);
    }

    #[test]
    fn key_with_only_blank_competitor_prices_has_no_data() {
        let own =
            Table::from_reader("date,store_id,sku_id,own_price\n2026-01-01,1,10,10.0\n".as_bytes())
                .unwrap();
        let comp = Table::from_reader(
            "date,store_id,sku_id,competitor,comp_price\n2026-01-01,1,10,Conc_A,\n".as_bytes(),
        )
        .unwrap();
        let table = build_monitor(&own, &comp, &RiskThresholds::default()).unwrap();
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.replace_monitor(&table).unwrap();

        let (n_obs, label): (Option<i64>, String) = storage
            .conn
            .query_row("SELECT comp_n_obs, risk_label FROM monitor", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(n_obs, None);
        assert_eq!(label, "SEM_DADO");
    }
}
