//! Parquet cache of close histories.
//!
//! Layout: `{cache_dir}/code={CODE}/prices.parquet` plus a `meta.json`
//! sidecar (date range, row count, BLAKE3 data hash, source).
//!
//! Writes go to a `.tmp` file first and are renamed into place. A file that
//! fails to read or validate is renamed to `.quarantined` and reported as
//! a cache miss.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::provider::{DataError, DataSource, PriceSource};
use crate::domain::{PricePoint, PriceSeries};

/// Metadata sidecar for a cached code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: chrono::NaiveDateTime,
}

pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn code_dir(&self, code: &str) -> PathBuf {
        self.cache_dir.join(format!("code={code}"))
    }

    fn data_path(&self, code: &str) -> PathBuf {
        self.code_dir(code).join("prices.parquet")
    }

    fn meta_path(&self, code: &str) -> PathBuf {
        self.code_dir(code).join("meta.json")
    }

    /// Replace the cached history for the series' code.
    pub fn write(&self, series: &PriceSeries, source: DataSource) -> Result<CacheMeta, DataError> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => {
                return Err(DataError::DataUnavailable {
                    code: series.code().to_string(),
                })
            }
        };

        let code = series.code();
        fs::create_dir_all(self.code_dir(code))?;

        let mut df = series_to_dataframe(series)?;
        let path = self.data_path(code);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Io(e)
        })?;

        let meta = CacheMeta {
            code: code.to_string(),
            start_date: first,
            end_date: last,
            row_count: series.len(),
            data_hash: series_hash(series),
            source,
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Parquet(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(code), meta_json)?;

        Ok(meta)
    }

    pub fn get_meta(&self, code: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(code)).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.data_path(code).exists()
    }
}

impl PriceSource for ParquetCache {
    fn name(&self) -> &str {
        "parquet-cache"
    }

    fn load(&self, code: &str) -> Result<PriceSeries, DataError> {
        let path = self.data_path(code);
        if !path.exists() {
            return Err(DataError::DataUnavailable {
                code: code.to_string(),
            });
        }

        match load_and_validate_parquet(code, &path) {
            Ok(series) => Ok(series),
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                warn!(
                    code,
                    path = %path.display(),
                    error = %e,
                    "quarantining corrupt cache file"
                );
                let _ = fs::rename(&path, &quarantine);
                Err(DataError::DataUnavailable {
                    code: code.to_string(),
                })
            }
        }
    }
}

/// BLAKE3 over dates and closes, stable across runs.
pub fn series_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.code().as_bytes());
    for p in series.points() {
        hasher.update(p.date.to_string().as_bytes());
        hasher.update(&p.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn series_to_dataframe(series: &PriceSeries) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = series
        .points()
        .iter()
        .map(|p| (p.date - epoch()).num_days() as i32)
        .collect();
    let closes: Vec<f64> = series.closes();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
    ])
    .map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path)?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(code: &str, path: &Path) -> Result<PriceSeries, DataError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::Parquet("empty parquet file".into()));
    }

    let col_err = |e: PolarsError| DataError::Parquet(format!("column read: {e}"));
    let date_ca = df
        .column("date")
        .map_err(col_err)?
        .date()
        .map_err(|e| DataError::Parquet(format!("date column type: {e}")))?;
    let close_ca = df
        .column("close")
        .map_err(col_err)?
        .f64()
        .map_err(|e| DataError::Parquet(format!("close column type: {e}")))?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::Parquet(format!("null date at row {i}")))?;
        let close = close_ca
            .get(i)
            .ok_or_else(|| DataError::Parquet(format!("null close at row {i}")))?;
        points.push(PricePoint::new(
            epoch() + chrono::Duration::days(days as i64),
            close,
        ));
    }

    Ok(PriceSeries::new(code, points)?)
}
