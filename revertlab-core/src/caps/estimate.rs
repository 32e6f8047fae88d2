//! Volatility and dip-frequency based cap suggestion.
//!
//! `raw_cap = target_vol / ann_vol` scales exposure to a volatility budget;
//! the dip frequency then discounts assets that rarely offer the drawdowns the
//! signal trades. The result is clipped to [0.1, 1.0].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::error::round_dp;
use crate::params::CapEstimateParams;
use crate::signal::n_day_return;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const MIN_SUGGESTED_CAP: f64 = 0.1;
const MAX_SUGGESTED_CAP: f64 = 1.0;

/// Diagnostics and the suggested cap for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapEstimate {
    /// Annualized volatility of daily returns, 4 dp.
    pub ann_vol: f64,
    /// Fraction of days with an N-day return at or below the dip threshold, 4 dp.
    pub dip_freq: f64,
    pub freq_factor: f64,
    pub raw_cap: f64,
    /// Clipped to [0.1, 1.0], 2 dp.
    pub suggested_cap: f64,
}

/// Step mapping from dip frequency to a cap multiplier.
pub fn freq_factor(dip_freq: f64) -> f64 {
    if dip_freq >= 0.04 {
        1.0
    } else if dip_freq >= 0.02 {
        0.8
    } else if dip_freq >= 0.01 {
        0.5
    } else {
        0.3
    }
}

/// Suggest a cap from a close history.
///
/// Returns `None` when the history has fewer than `min_history` observations.
pub fn estimate_asset_cap(closes: &[f64], params: &CapEstimateParams) -> Option<CapEstimate> {
    if closes.len() < params.min_history || closes.len() < 2 {
        return None;
    }

    let ret1: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let ann_vol = sample_std(&ret1) * TRADING_DAYS_PER_YEAR.sqrt();
    let raw_cap = if ann_vol > 0.0 {
        params.target_vol / ann_vol
    } else {
        params.fallback_cap
    };

    // Days without a full lookback count as non-dips.
    let dips = n_day_return(closes, params.lookback_n)
        .into_iter()
        .filter(|r| matches!(r, Some(r) if *r <= params.dip_threshold))
        .count();
    let dip_freq = dips as f64 / closes.len() as f64;

    let factor = freq_factor(dip_freq);
    let suggested = (raw_cap * factor).clamp(MIN_SUGGESTED_CAP, MAX_SUGGESTED_CAP);

    Some(CapEstimate {
        ann_vol: round_dp(ann_vol, 4),
        dip_freq: round_dp(dip_freq, 4),
        freq_factor: factor,
        raw_cap,
        suggested_cap: round_dp(suggested, 2),
    })
}

/// Estimate caps for many series, omitting those with too little history.
pub fn estimate_asset_caps<'a, I>(series: I, params: &CapEstimateParams) -> BTreeMap<String, CapEstimate>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    let mut out = BTreeMap::new();
    for s in series {
        match estimate_asset_cap(&s.closes(), params) {
            Some(est) => {
                out.insert(s.code().to_string(), est);
            }
            None => debug!(
                code = s.code(),
                observations = s.len(),
                min_history = params.min_history,
                "history too short for cap estimate, omitted"
            ),
        }
    }
    out
}

fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn alternating(n: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.0 * (1.0 + amplitude) })
            .collect()
    }

    #[test]
    fn short_history_is_omitted() {
        let params = CapEstimateParams::default();
        assert!(estimate_asset_cap(&vec![1.0; 251], &params).is_none());
        assert!(estimate_asset_cap(&vec![1.0; 252], &params).is_some());
    }

    #[test]
    fn flat_history_uses_fallback() {
        let est = estimate_asset_cap(&vec![1.0; 300], &CapEstimateParams::default()).unwrap();
        assert_eq!(est.ann_vol, 0.0);
        assert_eq!(est.raw_cap, 0.1);
        assert_eq!(est.dip_freq, 0.0);
        assert_eq!(est.freq_factor, 0.3);
        // 0.1 * 0.3 clipped up to the floor
        assert_eq!(est.suggested_cap, 0.1);
    }

    #[test]
    fn volatile_history_scales_down() {
        let est = estimate_asset_cap(&alternating(400, 0.02), &CapEstimateParams::default()).unwrap();
        assert!(est.ann_vol > 0.3);
        assert!(est.raw_cap < 0.3);
        assert!(est.suggested_cap >= 0.1 && est.suggested_cap <= 1.0);
    }

    #[test]
    fn factor_steps() {
        assert_eq!(freq_factor(0.05), 1.0);
        assert_eq!(freq_factor(0.04), 1.0);
        assert_eq!(freq_factor(0.03), 0.8);
        assert_eq!(freq_factor(0.01), 0.5);
        assert_eq!(freq_factor(0.0099), 0.3);
    }

    #[test]
    fn dips_counted_over_all_days() {
        // Only the final day's 5-day return is a dip; the denominator is
        // every day of the history, lookback days included.
        let mut closes = vec![100.0; 259];
        closes.push(90.0);
        let est = estimate_asset_cap(&closes, &CapEstimateParams::default()).unwrap();
        assert_eq!(est.dip_freq, round_dp(1.0 / 260.0, 4));
    }

    #[test]
    fn batch_omits_short_series() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let long = PriceSeries::from_closes("510300", start, &alternating(300, 0.01)).unwrap();
        let short = PriceSeries::from_closes("161226", start, &alternating(100, 0.01)).unwrap();
        let caps = estimate_asset_caps([&long, &short], &CapEstimateParams::default());
        assert_eq!(caps.len(), 1);
        assert!(caps.contains_key("510300"));
    }
}
