//! Hysteresis risk state machine.
//!
//! Four states: IDLE -> PROBE -> ACTIVE, with COOLDOWN entered only through
//! the hard stop. Evaluated once per day in chronological order.
//!
//! Precedence:
//! 1. Hard stop: with a reference price set, `close/ref - 1 <= -hard_stop_dd`
//!    forces COOLDOWN from any state and clears the reference.
//! 2. Otherwise the current state decides:
//!    - COOLDOWN -> PROBE on a rebound day (`ret1 >= rebound_y`)
//!    - IDLE -> PROBE when the effective target turns positive
//!    - ACTIVE -> PROBE on an unfavorable day (`ret1 <= -unfavorable_x`)
//!    - PROBE -> IDLE when the target vanishes, -> ACTIVE after
//!      `favorable_days` of probation without an unfavorable day
//!
//! Every entry into PROBE resets the reference price to today's close.

use serde::{Deserialize, Serialize};

use crate::domain::{DayMark, TradeState};
use crate::params::RiskParams;

/// State carried between days.
///
/// Each step takes the context by value and returns the next one. The caller
/// owns the single "current context" slot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskContext {
    pub state: TradeState,
    /// Only used for the hard-stop check.
    pub ref_price: Option<f64>,
    pub cooldown_since: Option<DayMark>,
    pub probe_start: Option<DayMark>,
}

impl RiskContext {
    /// Fresh context: IDLE with no reference price.
    pub fn new() -> Self {
        Self::default()
    }

    fn idle() -> Self {
        Self::default()
    }

    fn probe(t: DayMark, close: f64) -> Self {
        Self {
            state: TradeState::Probe,
            ref_price: Some(close),
            cooldown_since: None,
            probe_start: Some(t),
        }
    }

    fn active(close: f64) -> Self {
        Self {
            state: TradeState::Active,
            ref_price: Some(close),
            cooldown_since: None,
            probe_start: None,
        }
    }

    fn cooldown(t: DayMark) -> Self {
        Self {
            state: TradeState::Cooldown,
            ref_price: None,
            cooldown_since: Some(t),
            probe_start: None,
        }
    }

    /// True when the hard stop fires for `close` against the reference price.
    pub fn hard_stop_hit(&self, close: f64, params: &RiskParams) -> bool {
        match self.ref_price {
            Some(ref_price) => close / ref_price - 1.0 <= -params.hard_stop_dd,
            None => false,
        }
    }
}

/// Advance the machine by one day. Pure: no I/O, no hidden state.
pub fn step_fsm(
    t: DayMark,
    close_t: f64,
    ret1_t: f64,
    target_eff_t: f64,
    ctx: RiskContext,
    params: &RiskParams,
) -> RiskContext {
    if ctx.hard_stop_hit(close_t, params) {
        return RiskContext::cooldown(t);
    }

    match ctx.state {
        TradeState::Cooldown => {
            if ret1_t >= params.rebound_y {
                RiskContext::probe(t, close_t)
            } else {
                ctx
            }
        }
        TradeState::Idle => {
            if target_eff_t > 0.0 {
                RiskContext::probe(t, close_t)
            } else {
                ctx
            }
        }
        TradeState::Active => {
            if ret1_t <= -params.unfavorable_x {
                RiskContext::probe(t, close_t)
            } else {
                ctx
            }
        }
        TradeState::Probe => {
            // A PROBE context without a start date (e.g. restored from an
            // older snapshot) starts its probation today.
            let start = ctx.probe_start.unwrap_or(t);
            let days_in_probe = params.probe_clock.elapsed(start, t);

            if target_eff_t <= 0.0 {
                RiskContext::idle()
            } else if days_in_probe >= i64::from(params.favorable_days)
                && ret1_t > -params.unfavorable_x
            {
                RiskContext::active(close_t)
            } else {
                RiskContext {
                    probe_start: Some(start),
                    ..ctx
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(index: usize) -> DayMark {
        DayMark::new(
            index,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(index as i64),
        )
    }

    fn ctx(state: TradeState, ref_price: Option<f64>, probe_start: Option<DayMark>) -> RiskContext {
        RiskContext {
            state,
            ref_price,
            cooldown_since: None,
            probe_start,
        }
    }

    #[test]
    fn idle_enters_probe_on_positive_target() {
        let p = RiskParams::default();
        let next = step_fsm(day(3), 50.0, -0.01, 0.4, RiskContext::new(), &p);
        assert_eq!(next.state, TradeState::Probe);
        assert_eq!(next.ref_price, Some(50.0));
        assert_eq!(next.probe_start, Some(day(3)));
    }

    #[test]
    fn idle_stays_idle_without_target() {
        let p = RiskParams::default();
        let next = step_fsm(day(3), 50.0, -0.05, 0.0, RiskContext::new(), &p);
        assert_eq!(next, RiskContext::new());
    }

    #[test]
    fn hard_stop_from_every_state() {
        let p = RiskParams::default();
        for state in TradeState::ALL {
            let c = ctx(state, Some(100.0), Some(day(0)));
            let next = step_fsm(day(5), 89.0, 0.05, 0.8, c, &p);
            assert_eq!(next.state, TradeState::Cooldown, "from {state}");
            assert_eq!(next.ref_price, None);
            assert_eq!(next.cooldown_since, Some(day(5)));
            assert_eq!(next.probe_start, None);
        }
    }

    #[test]
    fn hard_stop_boundary_is_inclusive() {
        let p = RiskParams {
            hard_stop_dd: 0.25,
            ..RiskParams::default()
        };
        let c = ctx(TradeState::Active, Some(100.0), None);
        let next = step_fsm(day(1), 75.0, 0.0, 0.5, c, &p);
        assert_eq!(next.state, TradeState::Cooldown);
    }

    #[test]
    fn cooldown_unlocks_on_rebound() {
        let p = RiskParams::default();
        let c = RiskContext {
            state: TradeState::Cooldown,
            ref_price: None,
            cooldown_since: Some(day(1)),
            probe_start: None,
        };
        let next = step_fsm(day(4), 91.0, 0.025, 0.0, c, &p);
        assert_eq!(next.state, TradeState::Probe);
        assert_eq!(next.ref_price, Some(91.0));
        assert_eq!(next.probe_start, Some(day(4)));
        assert_eq!(next.cooldown_since, None);
    }

    #[test]
    fn cooldown_holds_below_rebound() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Cooldown, None, None);
        let next = step_fsm(day(4), 91.0, 0.019, 1.0, c, &p);
        assert_eq!(next, c);
    }

    #[test]
    fn active_degrades_on_unfavorable_day() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Active, Some(100.0), None);
        let next = step_fsm(day(9), 97.0, -0.02, 0.6, c, &p);
        assert_eq!(next.state, TradeState::Probe);
        assert_eq!(next.ref_price, Some(97.0));
        assert_eq!(next.probe_start, Some(day(9)));
    }

    #[test]
    fn active_keeps_reference_when_unchanged() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Active, Some(100.0), None);
        let next = step_fsm(day(9), 99.0, -0.01, 0.0, c, &p);
        assert_eq!(next, c);
    }

    #[test]
    fn probe_falls_back_to_idle_when_target_vanishes() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Probe, Some(100.0), Some(day(0)));
        let next = step_fsm(day(1), 101.0, 0.01, 0.0, c, &p);
        assert_eq!(next, RiskContext::new());
    }

    #[test]
    fn probe_promotes_after_favorable_days() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Probe, Some(100.0), Some(day(0)));

        let early = step_fsm(day(2), 100.5, 0.0, 0.3, c, &p);
        assert_eq!(early.state, TradeState::Probe);

        let promoted = step_fsm(day(3), 101.0, 0.0, 0.3, c, &p);
        assert_eq!(promoted.state, TradeState::Active);
        assert_eq!(promoted.ref_price, Some(101.0));
        assert_eq!(promoted.probe_start, None);
    }

    #[test]
    fn probe_promotion_blocked_by_unfavorable_day() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Probe, Some(100.0), Some(day(0)));
        let next = step_fsm(day(5), 98.0, -0.02, 0.3, c, &p);
        assert_eq!(next.state, TradeState::Probe);
        assert_eq!(next.probe_start, Some(day(0)));
    }

    #[test]
    fn probe_without_start_begins_probation_today() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Probe, Some(100.0), None);
        let next = step_fsm(day(7), 100.0, 0.0, 0.3, c, &p);
        assert_eq!(next.state, TradeState::Probe);
        assert_eq!(next.probe_start, Some(day(7)));
    }

    #[test]
    fn step_is_deterministic() {
        let p = RiskParams::default();
        let c = ctx(TradeState::Probe, Some(100.0), Some(day(0)));
        let a = step_fsm(day(4), 99.0, -0.01, 0.2, c, &p);
        let b = step_fsm(day(4), 99.0, -0.01, 0.2, c, &p);
        assert_eq!(a, b);
    }
}
