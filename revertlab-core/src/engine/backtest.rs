//! Single forward pass over a close series.
//!
//! Per day t:
//! 1. `ret1 = close[t]/close[t-1] - 1` (0 on day 0)
//! 2. `target_eff = target[t-1]` (0 on day 0): a signal seen today is acted on tomorrow
//! 3. Step the risk machine with `(t, close, ret1, target_eff)`
//! 4. `pos = min(max(target_eff, 0), state cap, asset cap)`
//! 5. `turnover = |pos - pos[t-1]|`, `cost = turnover * fee_rate`
//! 6. `strategy_return = pos[t-1] * ret1 - cost`: today's return is earned by
//!    yesterday's position
//! 7. `nav = nav[t-1] * (1 + strategy_return)` from a base of 1, drawdown
//!    against the running NAV peak

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{DayMark, PriceSeries, TradeState};
use crate::error::EngineError;
use crate::params::StrategyParams;
use crate::risk::{effective_cap, position_for, step_fsm, RiskContext};
use crate::signal::compute_target_position;

/// One simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: chrono::NaiveDate,
    pub close: f64,
    pub ret1: f64,
    pub target: f64,
    pub target_eff: f64,
    pub state: TradeState,
    pub cap: f64,
    pub pos: f64,
    pub turnover: f64,
    pub cost: f64,
    pub strategy_return: f64,
    pub nav: f64,
    pub drawdown: f64,
}

/// Full daily output of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub code: String,
    pub asset_cap: f64,
    pub rows: Vec<DailyRow>,
    /// Machine state after the last day, for callers that want to carry it.
    pub final_context: RiskContext,
}

impl BacktestRun {
    pub fn last(&self) -> Option<&DailyRow> {
        self.rows.last()
    }

    pub fn navs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.nav).collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.pos).collect()
    }
}

/// Run the strategy over `series` with the given asset ceiling.
pub fn run_backtest(
    series: &PriceSeries,
    params: &StrategyParams,
    asset_cap: f64,
) -> Result<BacktestRun, EngineError> {
    if series.is_empty() {
        return Err(EngineError::DataUnavailable {
            code: series.code().to_string(),
        });
    }
    if !(0.0..=1.0).contains(&asset_cap) {
        return Err(EngineError::InvalidAssetCap(asset_cap));
    }

    let closes = series.closes();
    let targets = compute_target_position(&closes, &params.signal);
    let fee_rate = params.cost.fee_rate();

    let mut rows = Vec::with_capacity(closes.len());
    let mut ctx = RiskContext::new();
    let mut prev_pos = 0.0;
    let mut prev_nav = 1.0;
    let mut peak = f64::NEG_INFINITY;

    for (t, point) in series.points().iter().enumerate() {
        let close = point.close;
        let (ret1, target_eff) = if t == 0 {
            (0.0, 0.0)
        } else {
            (close / closes[t - 1] - 1.0, targets[t - 1])
        };

        let next = step_fsm(DayMark::new(t, point.date), close, ret1, target_eff, ctx, &params.risk);
        if next.state != ctx.state {
            trace!(
                code = series.code(),
                date = %point.date,
                from = %ctx.state,
                to = %next.state,
                "risk state transition"
            );
        }
        ctx = next;

        let cap = effective_cap(ctx.state, target_eff, &params.risk);
        let pos = position_for(target_eff, cap, asset_cap);
        let turnover = (pos - prev_pos).abs();
        let cost = turnover * fee_rate;
        let strategy_return = prev_pos * ret1 - cost;
        let nav = prev_nav * (1.0 + strategy_return);
        peak = peak.max(nav);

        rows.push(DailyRow {
            date: point.date,
            close,
            ret1,
            target: targets[t],
            target_eff,
            state: ctx.state,
            cap,
            pos,
            turnover,
            cost,
            strategy_return,
            nav,
            drawdown: nav / peak - 1.0,
        });

        prev_pos = pos;
        prev_nav = nav;
    }

    Ok(BacktestRun {
        code: series.code().to_string(),
        asset_cap,
        rows,
        final_context: ctx,
    })
}
