//! One-line plain-English recommendation for a daily signal.

use crate::domain::TradeState;
use crate::export::daily_signal::{Action, DailySignal};

pub(crate) fn pct(x: f64) -> i64 {
    (x * 100.0).round() as i64
}

pub fn summarize_signal(signal: &DailySignal) -> String {
    let pos = signal.final_position;
    let core = if pos == 0.0 {
        match signal.state {
            TradeState::Active => {
                "Participation is allowed but no opportunity was detected today; stay flat and watch.".to_string()
            }
            TradeState::Probe => "Probation phase; opening a position is not advised yet.".to_string(),
            TradeState::Cooldown => "Risk cooldown in effect; stay flat.".to_string(),
            TradeState::Idle => "No strategy signal; stay flat.".to_string(),
        }
    } else {
        let p = pct(pos);
        match signal.state {
            TradeState::Active => format!("Opportunity confirmed; hold about {p}% of capital."),
            TradeState::Probe => format!("Probation phase; take a small position (about {p}%)."),
            TradeState::Idle | TradeState::Cooldown => format!("Hold about {p}% of capital."),
        }
    };

    let act = match signal.action {
        Action::Buy => "Increase the position.",
        Action::Sell => "Reduce the position.",
        Action::Hold => "No adjustment needed.",
    };

    format!("{core} {act}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::daily_signal::{Confidence, SignalMetrics};

    fn signal(pos: f64, state: TradeState, action: Action) -> DailySignal {
        DailySignal {
            code: "510300".into(),
            action,
            final_position: pos,
            state,
            confidence: Confidence::Medium,
            metrics: SignalMetrics {
                asset_cap: 0.3,
                target_position: pos,
                recent_return_1d: 0.0,
                drawdown_from_peak: 0.0,
            },
        }
    }

    #[test]
    fn flat_cooldown_says_stay_flat() {
        let text = summarize_signal(&signal(0.0, TradeState::Cooldown, Action::Sell));
        assert_eq!(text, "Risk cooldown in effect; stay flat. Reduce the position.");
    }

    #[test]
    fn probe_position_renders_integer_percent() {
        let text = summarize_signal(&signal(0.1249, TradeState::Probe, Action::Buy));
        assert!(text.contains("about 12%"));
        assert!(text.ends_with("Increase the position."));
    }

    #[test]
    fn active_hold() {
        let text = summarize_signal(&signal(0.3, TradeState::Active, Action::Hold));
        assert_eq!(text, "Opportunity confirmed; hold about 30% of capital. No adjustment needed.");
    }
}
