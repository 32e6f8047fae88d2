//! CSV directory source: `{dir}/{code}.csv` with `date,close` columns.
//!
//! Extra columns (open, high, volume, ...) are ignored. Rows whose close is
//! empty or unparseable are dropped; the rest are sorted and de-duplicated.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, PriceSource};
use crate::domain::{PricePoint, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    close: Option<String>,
}

pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }
}

impl PriceSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, code: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(code);
        if !path.exists() {
            return Err(DataError::DataUnavailable {
                code: code.to_string(),
            });
        }
        read_csv_series(code, &path)
    }
}

/// Parse a close-history CSV into a validated series.
pub fn read_csv_series(code: &str, path: &Path) -> Result<PriceSeries, DataError> {
    let bytes = fs::read(path)?;
    parse_csv_series(code, &bytes)
}

pub fn parse_csv_series(code: &str, bytes: &[u8]) -> Result<PriceSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut points = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|e| DataError::Csv(format!("row {}: {e}", i + 1)))?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| DataError::Csv(format!("row {}: bad date '{}': {e}", i + 1, row.date)))?;
        let close = row
            .close
            .as_deref()
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|c| c.is_finite() && *c > 0.0);
        if let Some(close) = close {
            points.push(PricePoint::new(date, close));
        }
    }

    if points.is_empty() {
        return Err(DataError::DataUnavailable {
            code: code.to_string(),
        });
    }
    Ok(PriceSeries::from_unsorted(code, points)?)
}
