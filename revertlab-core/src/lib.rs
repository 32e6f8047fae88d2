//! RevertLab Core: price series, dip signal, risk state machine, caps, backtest, signal export.
//!
//! This crate contains the pure engine:
//! - Domain types (price series, trade states, day markers)
//! - Parameter bundles with documented defaults
//! - Mean-reversion target exposure
//! - Four-state hysteresis risk machine (IDLE / PROBE / ACTIVE / COOLDOWN)
//! - Volatility and policy based asset caps
//! - Single-pass backtest with T+1 execution
//! - Daily signal export and portfolio aggregation
//! - Price sources (CSV, Parquet cache, synthetic)
//!
//! Everything except the data sources is synchronous and free of I/O.

pub mod caps;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod export;
pub mod params;
pub mod portfolio;
pub mod risk;
pub mod signal;

pub use error::EngineError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross threads for per-asset fan-out.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::TradeState>();
        require_sync::<domain::TradeState>();

        require_send::<params::StrategyParams>();
        require_sync::<params::StrategyParams>();
        require_send::<params::CapEstimateParams>();
        require_sync::<params::CapEstimateParams>();

        require_send::<risk::RiskContext>();
        require_sync::<risk::RiskContext>();
        require_send::<caps::AssetCapPolicy>();
        require_sync::<caps::AssetCapPolicy>();
        require_send::<caps::CapEstimate>();
        require_sync::<caps::CapEstimate>();

        require_send::<engine::BacktestRun>();
        require_sync::<engine::BacktestRun>();
        require_send::<export::DailySignal>();
        require_sync::<export::DailySignal>();
        require_send::<portfolio::AssetEvaluation>();
        require_sync::<portfolio::AssetEvaluation>();
        require_send::<portfolio::PortfolioAllocation>();
        require_sync::<portfolio::PortfolioAllocation>();

        require_send::<data::CsvDirSource>();
        require_sync::<data::CsvDirSource>();
        require_send::<data::ParquetCache>();
        require_sync::<data::ParquetCache>();
        require_send::<data::SyntheticSource>();
        require_sync::<data::SyntheticSource>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }

    /// The step function sees one day's values and the prior context only.
    #[test]
    fn step_fsm_takes_no_series() {
        fn _check(
            t: domain::DayMark,
            ctx: risk::RiskContext,
            p: &params::RiskParams,
        ) -> risk::RiskContext {
            risk::step_fsm(t, 1.0, 0.0, 0.0, ctx, p)
        }
    }
}
