//! Risk gating: the hysteresis state machine and the caps it implies.

pub mod exposure;
pub mod fsm;

pub use exposure::{cap_by_state, effective_cap, position_for};
pub use fsm::{step_fsm, RiskContext};
