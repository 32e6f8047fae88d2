//! Actionable signal from the last day of a backtest.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::TradeState;
use crate::engine::BacktestRun;
use crate::error::{round_dp, EngineError};
use crate::params::ExportParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub asset_cap: f64,
    /// Effective (one-day lagged) target on the last day.
    pub target_position: f64,
    pub recent_return_1d: f64,
    /// Strategy NAV drawdown from its running peak.
    pub drawdown_from_peak: f64,
}

/// One record per asset per evaluation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySignal {
    pub code: String,
    pub action: Action,
    pub final_position: f64,
    pub state: TradeState,
    pub confidence: Confidence,
    pub metrics: SignalMetrics,
}

/// Compare today's position with yesterday's.
pub fn classify_action(prev_pos: f64, final_position: f64, rebalance_threshold: f64) -> Action {
    let delta = final_position - prev_pos;
    if delta.abs() < rebalance_threshold {
        Action::Hold
    } else if delta > 0.0 {
        Action::Buy
    } else {
        Action::Sell
    }
}

pub fn classify_confidence(state: TradeState, final_position: f64, asset_cap: f64) -> Confidence {
    match state {
        TradeState::Active if final_position >= 0.5 * asset_cap => Confidence::High,
        TradeState::Active | TradeState::Probe => Confidence::Medium,
        TradeState::Idle | TradeState::Cooldown => Confidence::Low,
    }
}

/// Build the daily signal from the final row of `run`.
pub fn export_daily_signal(
    run: &BacktestRun,
    params: &ExportParams,
) -> Result<DailySignal, EngineError> {
    let last = run.last().ok_or_else(|| EngineError::DataUnavailable {
        code: run.code.clone(),
    })?;

    let n = run.rows.len();
    let prev_pos = if n >= 2 { run.rows[n - 2].pos } else { 0.0 };

    Ok(DailySignal {
        code: run.code.clone(),
        action: classify_action(prev_pos, last.pos, params.rebalance_threshold),
        final_position: round_dp(last.pos, 4),
        state: last.state,
        confidence: classify_confidence(last.state, last.pos, run.asset_cap),
        metrics: SignalMetrics {
            asset_cap: round_dp(run.asset_cap, 4),
            target_position: round_dp(last.target_eff, 4),
            recent_return_1d: round_dp(last.ret1, 4),
            drawdown_from_peak: round_dp(last.drawdown, 4),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DailyRow;
    use crate::risk::RiskContext;
    use chrono::NaiveDate;

    fn row(day: u32, pos: f64, state: TradeState) -> DailyRow {
        DailyRow {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close: 1.0,
            ret1: 0.012345,
            target: 0.0,
            target_eff: 0.33333,
            state,
            cap: 1.0,
            pos,
            turnover: 0.0,
            cost: 0.0,
            strategy_return: 0.0,
            nav: 1.0,
            drawdown: -0.054321,
        }
    }

    fn run(rows: Vec<DailyRow>, asset_cap: f64) -> BacktestRun {
        BacktestRun {
            code: "510300".into(),
            asset_cap,
            rows,
            final_context: RiskContext::new(),
        }
    }

    #[test]
    fn small_increase_is_buy() {
        assert_eq!(classify_action(0.10, 0.25, 0.01), Action::Buy);
        assert_eq!(classify_action(0.25, 0.10, 0.01), Action::Sell);
        assert_eq!(classify_action(0.25, 0.255, 0.01), Action::Hold);
    }

    #[test]
    fn confidence_levels() {
        assert_eq!(classify_confidence(TradeState::Active, 0.15, 0.3), Confidence::High);
        assert_eq!(classify_confidence(TradeState::Active, 0.1, 0.3), Confidence::Medium);
        assert_eq!(classify_confidence(TradeState::Probe, 0.25, 0.3), Confidence::Medium);
        assert_eq!(classify_confidence(TradeState::Cooldown, 0.0, 0.3), Confidence::Low);
        assert_eq!(classify_confidence(TradeState::Idle, 0.0, 0.3), Confidence::Low);
    }

    #[test]
    fn exports_last_row_rounded() {
        let r = run(
            vec![row(1, 0.10, TradeState::Probe), row(2, 0.25, TradeState::Active)],
            0.5,
        );
        let sig = export_daily_signal(&r, &ExportParams::default()).unwrap();
        assert_eq!(sig.action, Action::Buy);
        assert_eq!(sig.state, TradeState::Active);
        assert_eq!(sig.confidence, Confidence::High);
        assert_eq!(sig.final_position, 0.25);
        assert_eq!(sig.metrics.target_position, 0.3333);
        assert_eq!(sig.metrics.recent_return_1d, 0.0123);
        assert_eq!(sig.metrics.drawdown_from_peak, -0.0543);
    }

    #[test]
    fn single_row_compares_against_flat() {
        let r = run(vec![row(1, 0.2, TradeState::Probe)], 0.3);
        let sig = export_daily_signal(&r, &ExportParams::default()).unwrap();
        assert_eq!(sig.action, Action::Buy);
    }

    #[test]
    fn empty_run_is_data_unavailable() {
        let err = export_daily_signal(&run(Vec::new(), 0.3), &ExportParams::default()).unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }

    #[test]
    fn serializes_upper_case_labels() {
        let r = run(vec![row(1, 0.0, TradeState::Cooldown)], 0.3);
        let sig = export_daily_signal(&r, &ExportParams::default()).unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"action\":\"HOLD\""));
        assert!(json.contains("\"state\":\"COOLDOWN\""));
        assert!(json.contains("\"confidence\":\"LOW\""));
    }
}
