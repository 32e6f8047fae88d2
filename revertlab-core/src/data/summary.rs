//! Recent-window price summary for a single asset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::round_dp;

/// Latest close plus short-horizon returns over the last `lookback_days` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub code: String,
    pub as_of: NaiveDate,
    pub last_close: f64,
    pub return_1d: f64,
    pub return_5d: f64,
    pub return_20d: f64,
    /// Last close against the highest close of the window.
    pub drawdown_from_peak: f64,
    /// As requested, before the minimum of 2 is applied to the window.
    pub lookback_days: usize,
}

/// Summarize the tail of `series`; `None` when it is empty.
///
/// A horizon longer than the window falls back to first-to-last over the
/// window. The window holds at least 2 rows whatever `lookback_days` says.
pub fn summarize_prices(series: &PriceSeries, lookback_days: usize) -> Option<PriceSummary> {
    let window = series.tail(lookback_days.max(2));
    let closes = window.closes();
    let last_point = window.last()?;
    let last = last_point.close;

    let horizon_return = |h: usize| {
        let base = if closes.len() > h {
            closes[closes.len() - 1 - h]
        } else {
            closes[0]
        };
        round_dp(last / base - 1.0, 4)
    };

    let peak = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(PriceSummary {
        code: series.code().to_string(),
        as_of: last_point.date,
        last_close: last,
        return_1d: horizon_return(1),
        return_5d: horizon_return(5),
        return_20d: horizon_return(20),
        drawdown_from_peak: round_dp(last / peak - 1.0, 4),
        lookback_days,
    })
}
