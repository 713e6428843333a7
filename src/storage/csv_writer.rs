use crate::model::{Cell, MonitorTable, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes the monitor as CSV; missing values become empty fields.
pub fn write_csv(table: &MonitorTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_to(table, file)?;
    info!("Wrote {}", path.display());
    Ok(())
}

pub fn write_to<W: Write>(table: &MonitorTable, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.column_names())?;
    for row in &table.rows {
        out.write_record(table.columns.iter().map(|&c| format_cell(row.cell(c))))?;
    }
    out.flush()?;
    Ok(())
}

fn format_cell(cell: Cell<'_>) -> String {
    match cell {
        Cell::Text(s) => s.to_string(),
        Cell::Real(v) => v.to_string(),
        Cell::Integer(v) => v.to_string(),
        Cell::Missing => String::new(),
    }
}
