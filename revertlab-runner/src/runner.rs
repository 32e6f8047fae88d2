//! Per-asset evaluation: wires caps, backtest, export, and metrics together.
//!
//! Two entry points:
//! - `evaluate_asset()`: cap estimate → policy resolution → backtest → daily signal.
//!   Used by batch evaluation.
//! - `run_asset_backtest()`: loads one code and runs a backtest at a given cap,
//!   returning the full daily rows plus statistics. Used by the CLI `backtest`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use revertlab_core::caps::{estimate_asset_cap, resolve_asset_cap, AssetCapPolicy, CapEstimate};
use revertlab_core::data::DataSource;
use revertlab_core::domain::PriceSeries;
use revertlab_core::engine::{run_backtest, BacktestRun};
use revertlab_core::export::{export_daily_signal, summarize_signal};
use revertlab_core::portfolio::AssetEvaluation;
use revertlab_core::risk::RiskContext;
use revertlab_core::EngineError;

use crate::config::{ConfigError, EvaluationConfig};
use crate::data_loader::{LoadError, PriceLoader};
use crate::metrics::BacktestStats;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("no valid fund codes")]
    NoValidCodes,

    #[error("'{code}' has {observations} observations, {required} required for a cap estimate")]
    InsufficientHistory {
        code: String,
        observations: usize,
        required: usize,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Restrict a loaded history to the configured window.
pub fn apply_window(series: &PriceSeries, config: &EvaluationConfig) -> PriceSeries {
    match config.data.start_date {
        Some(start) => series.since(start),
        None => series.clone(),
    }
}

/// Evaluate one asset from its already-windowed history.
pub fn evaluate_asset(
    series: &PriceSeries,
    config: &EvaluationConfig,
    policy: &AssetCapPolicy,
) -> Result<AssetEvaluation, RunError> {
    let code = series.code();
    let estimate = estimate_asset_cap(&series.closes(), &config.cap_estimate).ok_or_else(|| {
        RunError::InsufficientHistory {
            code: code.to_string(),
            observations: series.len(),
            required: config.cap_estimate.min_history,
        }
    })?;

    let policy_cap = policy.cap_for(code);
    let final_cap = resolve_asset_cap(code, policy, estimate.suggested_cap);

    let run = run_backtest(series, &config.strategy_params(), final_cap)?;
    let signal = export_daily_signal(&run, &config.export)?;
    let summary = summarize_signal(&signal);

    debug!(
        code,
        suggested_cap = estimate.suggested_cap,
        final_cap,
        state = %signal.state,
        action = %signal.action,
        "asset evaluated"
    );

    Ok(AssetEvaluation {
        code: code.to_string(),
        suggested_cap: estimate.suggested_cap,
        policy_cap,
        final_cap,
        signal,
        summary,
    })
}

/// Complete result of a single-asset backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBacktest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub code: String,
    pub asset_cap: f64,
    /// Present when the history was long enough to estimate one.
    pub cap_estimate: Option<CapEstimate>,
    pub start_date: String,
    pub end_date: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub config_hash: String,
    pub stats: BacktestStats,
    pub run: BacktestRun,
}

impl AssetBacktest {
    pub fn final_context(&self) -> RiskContext {
        self.run.final_context
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load `code`, window it, and backtest at `asset_cap`.
///
/// Without an explicit cap the resolved cap (policy bounded suggestion) is
/// used, falling back to the policy cap when the history is too short to
/// estimate.
pub fn run_asset_backtest(
    code: &str,
    loader: &PriceLoader,
    config: &EvaluationConfig,
    asset_cap: Option<f64>,
) -> Result<AssetBacktest, RunError> {
    let loaded = loader.load(code)?;
    let series = apply_window(&loaded.series, config);

    let cap_estimate = estimate_asset_cap(&series.closes(), &config.cap_estimate);
    let asset_cap = asset_cap.unwrap_or_else(|| {
        let policy = config.policy_for(&[code]);
        match &cap_estimate {
            Some(est) => resolve_asset_cap(code, &policy, est.suggested_cap),
            None => policy.cap_for(code),
        }
    });

    let run = run_backtest(&series, &config.strategy_params(), asset_cap)?;
    let stats = BacktestStats::compute(&run.rows);

    Ok(AssetBacktest {
        schema_version: SCHEMA_VERSION,
        code: code.to_string(),
        asset_cap,
        cap_estimate,
        start_date: series.first().map(|p| p.date.to_string()).unwrap_or_default(),
        end_date: series.last().map(|p| p.date.to_string()).unwrap_or_default(),
        source: loaded.source,
        dataset_hash: loaded.dataset_hash,
        config_hash: config.config_hash(),
        stats,
        run,
    })
}
