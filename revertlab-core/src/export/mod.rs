//! Daily signal export and its text summary.

pub mod daily_signal;
pub mod summary;

pub use daily_signal::{
    classify_action, classify_confidence, export_daily_signal, Action, Confidence, DailySignal,
    SignalMetrics,
};
pub use summary::summarize_signal;
