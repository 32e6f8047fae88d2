//! Backtest engine.

pub mod backtest;

pub use backtest::{run_backtest, BacktestRun, DailyRow};
