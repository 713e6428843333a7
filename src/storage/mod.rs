// Storage module: persists the monitor table as CSV and as a SQLite table.

pub mod csv_writer;
pub mod sqlite;

pub use csv_writer::write_csv;
pub use sqlite::SqliteStorage;
