//! Price data sources: CSV exports, the Parquet cache, and synthetic walks.

pub mod cache;
pub mod codes;
pub mod csv_source;
pub mod history;
pub mod provider;
pub mod summary;
pub mod synthetic;

pub use cache::{series_hash, CacheMeta, ParquetCache};
pub use codes::{is_etf_code, valid_codes};
pub use csv_source::{parse_csv_series, read_csv_series, CsvDirSource};
pub use history::{price_history, PriceHistory, DEFAULT_HISTORY_LIMIT};
pub use provider::{DataError, DataSource, PriceSource};
pub use summary::{summarize_prices, PriceSummary};
pub use synthetic::{generate_synthetic_series, SyntheticSource};
