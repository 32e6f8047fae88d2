//! Deterministic synthetic closes for development runs.
//!
//! A random walk seeded from the BLAKE3 hash of the asset code, weekdays
//! only. Results built on it are tagged synthetic by the loader.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, PriceSource};
use crate::domain::{PricePoint, PriceSeries};

pub struct SyntheticSource {
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl PriceSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(&self, code: &str) -> Result<PriceSeries, DataError> {
        let series = generate_synthetic_series(code, self.start, self.end)?;
        if series.is_empty() {
            return Err(DataError::DataUnavailable {
                code: code.to_string(),
            });
        }
        Ok(series)
    }
}

pub fn generate_synthetic_series(
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    let seed: [u8; 32] = *blake3::hash(code.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::new();
    let mut price = 1.0_f64;
    let mut current = start;

    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            let daily_return: f64 = rng.gen_range(-0.025..0.025);
            price *= 1.0 + daily_return;
            points.push(PricePoint::new(current, price));
        }
        current += chrono::Duration::days(1);
    }

    Ok(PriceSeries::new(code, points)?)
}
