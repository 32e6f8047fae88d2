//! Price loading and data resolution for the runner.
//!
//! Fallback policy per asset code:
//! 1. Parquet cache hit → use it, unless the CSV export was modified after
//!    the cache entry was written
//! 2. CSV export in the data directory → parse, write through to the cache
//! 3. Synthetic enabled → generate a deterministic walk (tagged, warned)
//! 4. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use revertlab_core::data::{
    series_hash, CsvDirSource, DataError, DataSource, ParquetCache, PriceSource, SyntheticSource,
};
use revertlab_core::domain::PriceSeries;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no price data for '{code}' in cache or data directory (use --synthetic for synthetic data)")]
    NoData { code: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// A loaded series with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
    /// BLAKE3 over the code, dates, and closes.
    pub dataset_hash: String,
}

impl LoadedSeries {
    fn new(series: PriceSeries, source: DataSource) -> Self {
        let dataset_hash = series_hash(&series);
        Self {
            series,
            source,
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Chained price sources with a write-through cache.
#[derive(Default)]
pub struct PriceLoader {
    cache: Option<ParquetCache>,
    csv: Option<CsvDirSource>,
    synthetic: Option<SyntheticSource>,
    /// Skip the cache read (still written on CSV hits).
    force: bool,
}

impl PriceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = Some(ParquetCache::new(dir));
        self
    }

    pub fn with_csv_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.csv = Some(CsvDirSource::new(dir));
        self
    }

    /// Enable the synthetic fallback over `[start, end]`.
    pub fn with_synthetic(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.synthetic = Some(SyntheticSource::new(start, end));
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn load(&self, code: &str) -> Result<LoadedSeries, LoadError> {
        let stale = self.csv_newer_than_cache(code);
        if stale {
            debug!(code, "csv export is newer than the cache, re-importing");
        }

        if let (Some(cache), false) = (&self.cache, self.force || stale) {
            match cache.load(code) {
                Ok(series) => return Ok(LoadedSeries::new(series, DataSource::Cache)),
                Err(DataError::DataUnavailable { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(csv) = &self.csv {
            match csv.load(code) {
                Ok(series) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.write(&series, DataSource::CsvImport) {
                            warn!(code, error = %e, "failed to cache imported prices");
                        }
                    }
                    debug!(code, rows = series.len(), "loaded prices from csv");
                    return Ok(LoadedSeries::new(series, DataSource::CsvImport));
                }
                Err(DataError::DataUnavailable { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(synthetic) = &self.synthetic {
            warn!(code, "generating synthetic prices; results are tagged synthetic");
            let series = synthetic.load(code)?;
            return Ok(LoadedSeries::new(series, DataSource::Synthetic));
        }

        Err(LoadError::NoData {
            code: code.to_string(),
        })
    }

    /// True when both sources are configured and the CSV export changed after
    /// the cache entry was written. A cache entry without metadata counts as
    /// stale.
    fn csv_newer_than_cache(&self, code: &str) -> bool {
        let (Some(cache), Some(csv)) = (&self.cache, &self.csv) else {
            return false;
        };
        if !cache.contains(code) {
            return false;
        }
        let Ok(modified) = fs::metadata(csv.path_for(code)).and_then(|m| m.modified()) else {
            return false;
        };
        match cache.get_meta(code) {
            Some(meta) => {
                chrono::DateTime::<chrono::Local>::from(modified).naive_local() > meta.cached_at
            }
            None => true,
        }
    }

    /// Validate a CSV export and store it in the cache.
    pub fn import_csv(&self, code: &str, path: &std::path::Path) -> Result<LoadedSeries, LoadError> {
        let series = revertlab_core::data::read_csv_series(code, path)?;
        if let Some(cache) = &self.cache {
            cache.write(&series, DataSource::CsvImport)?;
        }
        Ok(LoadedSeries::new(series, DataSource::CsvImport))
    }
}
