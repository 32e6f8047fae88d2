//! Risk states and the day marker the state machine is stepped with.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four gating states of the risk machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeState {
    /// No signal; zero exposure.
    #[default]
    Idle,
    /// Probation: signal-weighted, reduced exposure.
    Probe,
    /// Full participation up to the active cap.
    Active,
    /// Forced flat after a hard stop, until a rebound day.
    Cooldown,
}

impl TradeState {
    pub const ALL: [TradeState; 4] = [
        TradeState::Idle,
        TradeState::Probe,
        TradeState::Active,
        TradeState::Cooldown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeState::Idle => "IDLE",
            TradeState::Probe => "PROBE",
            TradeState::Active => "ACTIVE",
            TradeState::Cooldown => "COOLDOWN",
        }
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated day: its position in the series and its calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayMark {
    pub index: usize,
    pub date: NaiveDate,
}

impl DayMark {
    pub fn new(index: usize, date: NaiveDate) -> Self {
        Self { index, date }
    }
}
