//! Date-bounded listing of daily closes for a single asset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PricePoint, PriceSeries};
use crate::error::round_dp;

/// Rows kept when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub code: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub count: usize,
    pub records: Vec<PricePoint>,
}

/// Closes within `[start, end]` (both inclusive, either open), keeping the
/// last `limit` rows. A `limit` of 0 keeps every row in range.
pub fn price_history(
    series: &PriceSeries,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    limit: usize,
) -> PriceHistory {
    let mut records: Vec<PricePoint> = series
        .points()
        .iter()
        .filter(|p| start.map_or(true, |s| p.date >= s))
        .filter(|p| end.map_or(true, |e| p.date <= e))
        .map(|p| PricePoint::new(p.date, round_dp(p.close, 4)))
        .collect();

    if limit > 0 && records.len() > limit {
        records.drain(..records.len() - limit);
    }

    PriceHistory {
        code: series.code().to_string(),
        start,
        end,
        count: records.len(),
        records,
    }
}
