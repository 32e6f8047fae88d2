//! Scenario and no-look-ahead tests for the signal, risk machine, backtest, and export.

use chrono::NaiveDate;
use revertlab_core::domain::{DayMark, PriceSeries, TradeState};
use revertlab_core::engine::run_backtest;
use revertlab_core::export::{classify_action, export_daily_signal, Action};
use revertlab_core::params::{ExportParams, ProbeClock, RiskParams, SignalParams, StrategyParams};
use revertlab_core::risk::{step_fsm, RiskContext};
use revertlab_core::signal::compute_target_position;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes("510300", start(), closes).unwrap()
}

fn day(index: usize) -> DayMark {
    DayMark::new(index, start() + chrono::Duration::days(index as i64))
}

#[test]
fn flat_week_then_five_percent_drop_is_full_target() {
    let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 95.0];
    let params = SignalParams {
        lookback_n: 5,
        th_big: -0.05,
        ..SignalParams::default()
    };
    let target = compute_target_position(&closes, &params);
    assert_eq!(target[6], 1.0);
}

#[test]
fn eleven_percent_below_reference_forces_cooldown_from_any_state() {
    let params = RiskParams {
        hard_stop_dd: 0.10,
        ..RiskParams::default()
    };
    for state in TradeState::ALL {
        let ctx = RiskContext {
            state,
            ref_price: Some(100.0),
            cooldown_since: None,
            probe_start: Some(day(0)),
        };
        let next = step_fsm(day(4), 89.0, 0.0, 0.5, ctx, &params);
        assert_eq!(next.state, TradeState::Cooldown, "from {state}");
    }
}

#[test]
fn increase_from_ten_to_twenty_five_percent_is_buy() {
    assert_eq!(classify_action(0.10, 0.25, 0.01), Action::Buy);
}

#[test]
fn rebound_day_unlocks_cooldown_with_fresh_reference() {
    let params = RiskParams {
        rebound_y: 0.02,
        ..RiskParams::default()
    };
    let ctx = RiskContext {
        state: TradeState::Cooldown,
        ref_price: None,
        cooldown_since: Some(day(1)),
        probe_start: None,
    };
    let next = step_fsm(day(5), 88.2, 0.025, 0.0, ctx, &params);
    assert_eq!(next.state, TradeState::Probe);
    assert_eq!(next.ref_price, Some(88.2));
}

/// Changing tomorrow's close must not change anything up to today.
#[test]
fn backtest_rows_do_not_depend_on_future_closes() {
    let base: Vec<f64> = (0..80)
        .map(|i| 100.0 * (1.0 + 0.06 * ((i as f64) * 0.45).sin()))
        .collect();
    let mut altered = base.clone();
    for c in altered.iter_mut().skip(50) {
        *c *= 0.8;
    }

    let params = StrategyParams::default();
    let a = run_backtest(&series(&base), &params, 1.0).unwrap();
    let b = run_backtest(&series(&altered), &params, 1.0).unwrap();
    assert_eq!(a.rows[..50], b.rows[..50]);
}

/// Today's return is earned by yesterday's position only.
#[test]
fn strategy_return_uses_previous_position() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 * (1.0 + 0.07 * ((i as f64) * 0.6).cos()))
        .collect();
    let run = run_backtest(&series(&closes), &StrategyParams::default(), 1.0).unwrap();
    for t in 1..run.rows.len() {
        let prev = run.rows[t - 1].pos;
        let row = run.rows[t];
        let expected = prev * row.ret1 - row.cost;
        assert!((row.strategy_return - expected).abs() < 1e-15);
        let nav = run.rows[t - 1].nav * (1.0 + row.strategy_return);
        assert!((row.nav - nav).abs() < 1e-12);
    }
}

/// A sustained dip walks IDLE -> PROBE -> ACTIVE, then a crash hits the stop
/// and a rebound re-enters probation.
#[test]
fn full_cycle_through_all_states() {
    let mut closes = vec![100.0; 6];
    // Grind lower 1.5% a day: target climbs, no single day is unfavorable.
    let mut p = 100.0;
    for _ in 0..8 {
        p *= 0.985;
        closes.push(p);
    }
    // Crash well past the hard stop from the promotion reference.
    p *= 0.85;
    closes.push(p);
    closes.push(p);
    // Rebound day.
    p *= 1.03;
    closes.push(p);

    let run = run_backtest(&series(&closes), &StrategyParams::default(), 1.0).unwrap();
    let states: Vec<TradeState> = run.rows.iter().map(|r| r.state).collect();

    let first_probe = states.iter().position(|s| *s == TradeState::Probe).unwrap();
    let first_active = states.iter().position(|s| *s == TradeState::Active).unwrap();
    let first_cooldown = states.iter().position(|s| *s == TradeState::Cooldown).unwrap();
    assert!(first_probe < first_active);
    assert!(first_active < first_cooldown);
    assert_eq!(run.rows[first_cooldown].pos, 0.0);
    assert_eq!(*states.last().unwrap(), TradeState::Probe);
}

#[test]
fn trading_day_clock_ignores_weekend_gaps() {
    // Friday probe start, Monday check: 3 calendar days, 1 trading day.
    let fri = DayMark::new(10, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    let mon = DayMark::new(11, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    let ctx = RiskContext {
        state: TradeState::Probe,
        ref_price: Some(100.0),
        cooldown_since: None,
        probe_start: Some(fri),
    };

    let calendar = RiskParams::default();
    assert_eq!(
        step_fsm(mon, 100.0, 0.0, 0.5, ctx, &calendar).state,
        TradeState::Active
    );

    let trading = RiskParams {
        probe_clock: ProbeClock::TradingDays,
        ..RiskParams::default()
    };
    assert_eq!(
        step_fsm(mon, 100.0, 0.0, 0.5, ctx, &trading).state,
        TradeState::Probe
    );
}

#[test]
fn export_uses_run_cap_and_last_two_positions() {
    let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 97.0, 97.0];
    let run = run_backtest(&series(&closes), &StrategyParams::default(), 0.3).unwrap();
    let signal = export_daily_signal(&run, &ExportParams::default()).unwrap();
    assert_eq!(signal.code, "510300");
    assert_eq!(signal.metrics.asset_cap, 0.3);
    assert_eq!(signal.state, TradeState::Probe);
    assert_eq!(signal.final_position, 0.25);
    assert_eq!(signal.action, Action::Buy);
}
