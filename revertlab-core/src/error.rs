//! Engine-level errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no price history available for '{code}'")]
    DataUnavailable { code: String },

    #[error("asset cap must be within [0, 1], got {0}")]
    InvalidAssetCap(f64),
}

/// Round half away from zero to `dp` decimal places.
pub(crate) fn round_dp(x: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (x * scale).round() / scale
}
