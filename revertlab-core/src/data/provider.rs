//! Price source trait and structured error types.
//!
//! `PriceSource` abstracts over where closes come from (CSV export, Parquet
//! cache, synthetic walk) so the runner can chain sources and tests can mock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no price data for '{code}'")]
    DataUnavailable { code: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid price series: {0}")]
    Validation(#[from] SeriesError),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvImport,
    Cache,
    Synthetic,
}

/// A provider of daily close histories keyed by asset code.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Full available history for `code`, date ascending.
    fn load(&self, code: &str) -> Result<PriceSeries, DataError>;
}
