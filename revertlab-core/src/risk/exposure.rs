//! State-indexed caps and the resulting position.

use crate::domain::TradeState;
use crate::params::RiskParams;

/// The exposure ceiling attached to each state.
pub fn cap_by_state(state: TradeState, params: &RiskParams) -> f64 {
    match state {
        TradeState::Idle => params.cap_idle,
        TradeState::Probe => params.cap_probe,
        TradeState::Active => params.cap_active,
        TradeState::Cooldown => params.cap_cooldown,
    }
}

/// State cap after the PROBE tightening: while on probation exposure never
/// exceeds the raw signal strength.
pub fn effective_cap(state: TradeState, target_eff: f64, params: &RiskParams) -> f64 {
    let cap = cap_by_state(state, params);
    match state {
        TradeState::Probe => cap.min(target_eff),
        _ => cap,
    }
}

/// `min(max(target_eff, 0), cap, asset_cap)`.
pub fn position_for(target_eff: f64, cap: f64, asset_cap: f64) -> f64 {
    target_eff.max(0.0).min(cap).min(asset_cap).max(0.0)
}
