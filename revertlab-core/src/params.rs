//! Parameter bundles for the signal, risk machine, costs, cap estimation, and export.
//!
//! All bundles are plain immutable structs with documented defaults. Every
//! field is `#[serde(default)]` so a TOML section may name only the fields it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::domain::DayMark;

/// Mean-reversion signal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    /// N-day return lookback, in observations. Default 5.
    pub lookback_n: usize,
    /// Informational "small dip" threshold. Default 0.0.
    pub th_small: f64,
    /// Informational "medium dip" threshold. Default -0.02.
    pub th_mid: f64,
    /// N-day loss at which target exposure reaches 1.0. Default -0.05.
    pub th_big: f64,
}

impl SignalParams {
    /// `K = |th_big|`, the loss that maps to full exposure.
    pub fn full_scale(&self) -> f64 {
        self.th_big.abs()
    }
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            lookback_n: 5,
            th_small: 0.0,
            th_mid: -0.02,
            th_big: -0.05,
        }
    }
}

/// How time spent in PROBE is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbeClock {
    /// Calendar days between the probe start date and today.
    #[default]
    CalendarDays,
    /// Simulated days (series observations) since the probe started.
    TradingDays,
}

impl ProbeClock {
    /// Days elapsed from `start` to `now` under this clock.
    pub fn elapsed(&self, start: DayMark, now: DayMark) -> i64 {
        match self {
            ProbeClock::CalendarDays => (now.date - start.date).num_days(),
            ProbeClock::TradingDays => now.index as i64 - start.index as i64,
        }
    }
}

/// Risk state machine parameters and the state-indexed caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    /// Loss from the reference price that forces COOLDOWN. Default 0.10.
    pub hard_stop_dd: f64,
    /// One-day return that unlocks COOLDOWN into PROBE. Default 0.02.
    pub rebound_y: f64,
    /// Minimum probation length before promotion to ACTIVE. Default 3.
    pub favorable_days: u32,
    /// One-day loss that demotes ACTIVE and blocks promotion. Default 0.02.
    pub unfavorable_x: f64,
    pub cap_idle: f64,
    pub cap_probe: f64,
    pub cap_active: f64,
    pub cap_cooldown: f64,
    pub probe_clock: ProbeClock,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            hard_stop_dd: 0.10,
            rebound_y: 0.02,
            favorable_days: 3,
            unfavorable_x: 0.02,
            cap_idle: 0.0,
            cap_probe: 0.25,
            cap_active: 1.0,
            cap_cooldown: 0.0,
            probe_clock: ProbeClock::CalendarDays,
        }
    }
}

/// Flat proportional trading cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParams {
    /// Fee per unit of turnover, in basis points. Default 10.
    pub fee_bps: f64,
}

impl CostParams {
    pub fn fee_rate(&self) -> f64 {
        self.fee_bps / 10_000.0
    }
}

impl Default for CostParams {
    fn default() -> Self {
        Self { fee_bps: 10.0 }
    }
}

/// Volatility/dip-frequency cap estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapEstimateParams {
    /// Lookback for the dip-frequency N-day return. Default 5.
    pub lookback_n: usize,
    /// N-day return at or below which a day counts as a dip. Default -0.05.
    pub dip_threshold: f64,
    /// Annualized volatility budget. Default 0.08.
    pub target_vol: f64,
    /// Minimum observations required to estimate. Default 252.
    pub min_history: usize,
    /// Raw cap used when realized volatility is zero. Default 0.1.
    pub fallback_cap: f64,
}

impl Default for CapEstimateParams {
    fn default() -> Self {
        Self {
            lookback_n: 5,
            dip_threshold: -0.05,
            target_vol: 0.08,
            min_history: 252,
            fallback_cap: 0.1,
        }
    }
}

/// Daily signal export parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    /// Position changes smaller than this are reported as HOLD. Default 0.01.
    pub rebalance_threshold: f64,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            rebalance_threshold: 0.01,
        }
    }
}

/// Everything the backtest pass needs besides the series and asset cap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyParams {
    pub signal: SignalParams,
    pub risk: RiskParams,
    pub cost: CostParams,
}
