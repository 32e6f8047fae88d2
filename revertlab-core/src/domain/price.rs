//! Price series: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily close for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Reasons a sequence of closes cannot form a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("dates must be strictly increasing: {prev} followed by {date} at index {index}")]
    NotIncreasing {
        index: usize,
        prev: NaiveDate,
        date: NaiveDate,
    },

    #[error("close on {date} must be finite and positive, got {close}")]
    InvalidClose { date: NaiveDate, close: f64 },
}

/// Ordered daily closes for one asset code.
///
/// Construction validates the two structural guarantees the engine relies on:
/// dates strictly increase (no duplicates) and every close is finite and > 0.
/// Gaps between dates are allowed. An empty series is valid; the engine
/// reports it as unavailable data rather than refusing to build it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    code: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points that are already in date order.
    pub fn new(code: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    date: p.date,
                    close: p.close,
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(SeriesError::NotIncreasing {
                    index: i,
                    prev: points[i - 1].date,
                    date: p.date,
                });
            }
        }
        Ok(Self {
            code: code.into(),
            points,
        })
    }

    /// Build a series from unordered provider rows.
    ///
    /// Sorts by date and keeps the last row seen for a repeated date, which is
    /// how provider corrections are published.
    pub fn from_unsorted(
        code: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, SeriesError> {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        Self::new(code, deduped)
    }

    /// Build a series of consecutive calendar days starting at `start`.
    pub fn from_closes(
        code: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, SeriesError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(code, points)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// The sub-series on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            code: self.code.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start)
                .copied()
                .collect(),
        }
    }

    /// The last `n` points (or the whole series if shorter).
    pub fn tail(&self, n: usize) -> Self {
        let skip = self.points.len().saturating_sub(n);
        Self {
            code: self.code.clone(),
            points: self.points[skip..].to_vec(),
        }
    }
}
