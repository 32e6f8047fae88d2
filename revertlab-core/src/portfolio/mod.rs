//! Portfolio aggregation of per-asset signals.
//!
//! Weights are plain proportions of the summed positions. No correlation or
//! optimization is applied.

use serde::{Deserialize, Serialize};

use crate::domain::TradeState;
use crate::error::round_dp;
use crate::export::summary::pct;
use crate::export::{Action, DailySignal};

/// Everything evaluated for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEvaluation {
    pub code: String,
    pub suggested_cap: f64,
    pub policy_cap: f64,
    pub final_cap: f64,
    pub signal: DailySignal,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub code: String,
    pub target_position: f64,
    pub target_amount: Option<f64>,
    pub target_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub allocations: Vec<Allocation>,
    pub total_amount: Option<f64>,
    pub total_position_amount: Option<f64>,
    pub summary: String,
}

/// Combine per-asset evaluations into weights and amounts.
pub fn aggregate_portfolio(
    assets: &[AssetEvaluation],
    total_amount: Option<f64>,
) -> PortfolioAllocation {
    let total_pos: f64 = assets.iter().map(|a| a.signal.final_position).sum();

    let allocations = assets
        .iter()
        .map(|a| {
            let pos = a.signal.final_position;
            Allocation {
                code: a.code.clone(),
                target_position: round_dp(pos, 4),
                target_amount: total_amount.map(|amt| round_dp(amt * pos, 2)),
                target_weight: (total_pos > 0.0).then(|| round_dp(pos / total_pos, 4)),
            }
        })
        .collect();

    PortfolioAllocation {
        allocations,
        total_amount,
        total_position_amount: total_amount.map(|amt| round_dp(amt * total_pos, 2)),
        summary: summarize_portfolio(assets, total_amount),
    }
}

/// Plain-English portfolio note: position, amount, state, action.
pub fn summarize_portfolio(assets: &[AssetEvaluation], total_amount: Option<f64>) -> String {
    if assets.is_empty() {
        return "No assets available; the portfolio stays flat.".to_string();
    }

    let total_pos: f64 = assets.iter().map(|a| a.signal.final_position).sum();
    let total_cap: f64 = assets.iter().map(|a| a.final_cap).sum();

    let pos_note = if total_cap > 0.0 {
        format!(
            "Suggested total position about {}%, portfolio cap about {}%.",
            pct(total_pos),
            pct(total_cap)
        )
    } else {
        format!("Suggested total position about {}%.", pct(total_pos))
    };

    let buys = assets.iter().filter(|a| a.signal.action == Action::Buy).count();
    let sells = assets.iter().filter(|a| a.signal.action == Action::Sell).count();
    let action_note = match (buys > 0, sells > 0) {
        (true, false) => "Overall the portfolio leans toward buying.",
        (false, true) => "Overall the portfolio leans toward selling.",
        (true, true) => "Mixed buys and sells; adjust each asset per its signal.",
        (false, false) => "No change needed.",
    };

    let any = |s: TradeState| assets.iter().any(|a| a.signal.state == s);
    let state_note = if any(TradeState::Cooldown) {
        "Some assets are in a risk cooldown."
    } else if assets.iter().all(|a| a.signal.state == TradeState::Idle) {
        "No active signal across the portfolio."
    } else if any(TradeState::Probe) {
        "Some assets are in probation."
    } else {
        "Full participation is allowed."
    };

    match total_amount {
        Some(amount) => {
            let amount_note = format!(
                "Corresponding capital about {}.",
                (amount * total_pos).round() as i64
            );
            format!("{pos_note} {amount_note} {state_note} {action_note}")
        }
        None => format!("{pos_note} {state_note} {action_note}"),
    }
}
