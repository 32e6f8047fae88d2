//! Performance statistics: pure functions over backtest rows.
//!
//! Diagnostics only; nothing here feeds back into position sizing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use revertlab_core::domain::TradeState;
use revertlab_core::engine::DailyRow;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStats {
    pub days: usize,
    pub total_return: f64,
    /// `nav_last^(252/days) - 1`.
    pub ann_return: f64,
    pub ann_vol: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub avg_position: f64,
    /// Days with non-zero turnover.
    pub trade_days: usize,
    pub total_cost: f64,
    /// Fraction of days spent in each state; all four keys present.
    pub state_fractions: BTreeMap<TradeState, f64>,
}

impl BacktestStats {
    pub fn compute(rows: &[DailyRow]) -> Self {
        let returns: Vec<f64> = rows.iter().map(|r| r.strategy_return).collect();
        let positions: Vec<f64> = rows.iter().map(|r| r.pos).collect();
        let nav_last = rows.last().map_or(1.0, |r| r.nav);

        Self {
            days: rows.len(),
            total_return: nav_last - 1.0,
            ann_return: annualized_return(nav_last, rows.len()),
            ann_vol: std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt(),
            sharpe: sharpe_ratio(&returns),
            max_drawdown: rows.iter().map(|r| r.drawdown).fold(0.0, f64::min),
            avg_position: mean_f64(&positions),
            trade_days: rows.iter().filter(|r| r.turnover > 0.0).count(),
            total_cost: rows.iter().map(|r| r.cost).sum(),
            state_fractions: state_fractions(rows),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `nav^(252/days) - 1`; 0 for an empty run or a non-positive NAV.
pub fn annualized_return(nav_last: f64, days: usize) -> f64 {
    if days == 0 || nav_last <= 0.0 {
        return 0.0;
    }
    nav_last.powf(TRADING_DAYS_PER_YEAR / days as f64) - 1.0
}

/// Annualized Sharpe ratio of daily returns with a zero risk-free rate.
///
/// Returns 0.0 if variance is zero or fewer than 2 days.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

pub fn state_fractions(rows: &[DailyRow]) -> BTreeMap<TradeState, f64> {
    let mut out: BTreeMap<TradeState, f64> = TradeState::ALL.iter().map(|s| (*s, 0.0)).collect();
    if rows.is_empty() {
        return out;
    }
    for row in rows {
        *out.entry(row.state).or_insert(0.0) += 1.0;
    }
    let n = rows.len() as f64;
    for v in out.values_mut() {
        *v /= n;
    }
    out
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
