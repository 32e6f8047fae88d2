//! RevertLab Runner: evaluation orchestration, batch fan-out, metrics, artifacts.
//!
//! This crate builds on `revertlab-core` to provide:
//! - TOML configuration with validation and fingerprinting
//! - Price loading with cache / CSV / synthetic fallback
//! - Per-asset evaluation (cap estimate, policy, backtest, daily signal)
//! - Parallel batch evaluation with per-asset failure isolation
//! - Backtest statistics
//! - JSON / CSV / Markdown export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use batch::{evaluate_assets, AssetFailure, EvaluationReport, EvaluationRequest};
pub use config::{ConfigError, EvaluationConfig};
pub use data_loader::{LoadError, LoadedSeries, PriceLoader};
pub use metrics::BacktestStats;
pub use runner::{apply_window, evaluate_asset, run_asset_backtest, AssetBacktest, RunError, SCHEMA_VERSION};
