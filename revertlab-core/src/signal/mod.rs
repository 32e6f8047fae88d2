//! Mean-reversion target exposure.
//!
//! The N-day return drives a piecewise-linear "buy the dip" curve:
//! target[t] = clip(-ret_n[t] / K, 0, 1) when ret_n[t] < 0, else 0,
//! with K = |th_big|. Days without a full lookback resolve to 0.
//! Lookback: lookback_n.

use crate::params::SignalParams;

/// N-day simple return per day: `close[t] / close[t-n] - 1`.
///
/// `None` for the first `n` days, where the lookback is incomplete.
pub fn n_day_return(closes: &[f64], n: usize) -> Vec<Option<f64>> {
    closes
        .iter()
        .enumerate()
        .map(|(t, &close)| {
            if t >= n {
                Some(close / closes[t - n] - 1.0)
            } else {
                None
            }
        })
        .collect()
}

/// Map a single N-day return onto the exposure curve.
pub fn target_from_return(ret_n: f64, full_scale: f64) -> f64 {
    if ret_n.is_nan() || ret_n >= 0.0 {
        return 0.0;
    }
    if full_scale <= 0.0 {
        return 1.0;
    }
    (-ret_n / full_scale).clamp(0.0, 1.0)
}

/// Target exposure in [0, 1] for every day of the series.
pub fn compute_target_position(closes: &[f64], params: &SignalParams) -> Vec<f64> {
    let k = params.full_scale();
    n_day_return(closes, params.lookback_n)
        .into_iter()
        .map(|r| r.map_or(0.0, |r| target_from_return(r, k)))
        .collect()
}
