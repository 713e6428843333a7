// Loader module: reads CSV inputs and extracts typed price records.

pub mod records;
pub mod table;

pub use records::{parse_competitor_observations, parse_own_prices};
pub use table::{load, Table};
