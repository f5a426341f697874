use std::time::{Duration, Instant};

use crate::compliance::RequirementTable;

/// Items configured below this threshold get the softer "possibly missing"
/// wording when absent.
const LOW_CONFIDENCE_CUTOFF: f32 = 0.6;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Severity channel of a spoken alert.
///
/// `PossiblyMissing` is derived from the *configured* threshold of a missing
/// item, not from any confidence observed in the frame: a label that was not
/// seen at all is still phrased by how strict its table entry is. Preserved
/// source behavior; treat it as a property of the table, not of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertSeverity {
    AllClear,
    PossiblyMissing,
    Violation,
}

/// One alert ready to be spoken.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertMessage {
    pub severity: AlertSeverity,
    pub text: String,
}

/// Cooldown state for one live-inspection session.
///
/// Mutated only when a message is actually emitted; a suppressed cycle leaves
/// the timestamp untouched. Discarded when the session ends.
#[derive(Debug)]
pub struct AlertState {
    last_alert: Option<Instant>,
    cooldown: Duration,
}

impl AlertState {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_alert: None,
            cooldown,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        match self.last_alert {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }
}

/// Decides whether to emit an alert each cycle and formats the message.
pub struct AlertDispatcher {
    table: RequirementTable,
    state: AlertState,
}

impl AlertDispatcher {
    pub fn new(table: RequirementTable, cooldown: Duration) -> Self {
        Self {
            table,
            state: AlertState::new(cooldown),
        }
    }

    /// Emit at most one message for this cycle.
    ///
    /// The cooldown gates positive and negative messages alike: nothing is
    /// emitted (and no state changes) until strictly more than the cooldown
    /// has elapsed since the last emission.
    pub fn maybe_alert(&mut self, missing: &[String], now: Instant) -> Option<AlertMessage> {
        if !self.state.ready(now) {
            return None;
        }
        let message = self.compose(missing);
        self.state.last_alert = Some(now);
        Some(message)
    }

    fn compose(&self, missing: &[String]) -> AlertMessage {
        if missing.is_empty() {
            return AlertMessage {
                severity: AlertSeverity::AllClear,
                text: "All required equipment detected.".to_string(),
            };
        }

        // Wording keys off configured thresholds; when any missing item has a
        // lax threshold, only those items are read out.
        let low_confidence: Vec<&str> = missing
            .iter()
            .filter(|label| {
                self.table
                    .get(label)
                    .map(|req| req.min_confidence < LOW_CONFIDENCE_CUTOFF)
                    .unwrap_or(false)
            })
            .map(|label| label.as_str())
            .collect();

        if !low_confidence.is_empty() {
            AlertMessage {
                severity: AlertSeverity::PossiblyMissing,
                text: format!(
                    "Warning! Possibly missing: {} (low confidence)",
                    low_confidence.join(", ")
                ),
            }
        } else {
            AlertMessage {
                severity: AlertSeverity::Violation,
                text: format!("Safety violation! Confirmed missing: {}", missing.join(", ")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::Requirement;

    fn table() -> RequirementTable {
        RequirementTable::site_default()
    }

    fn missing(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn cooldown_suppresses_second_alert() {
        let mut dispatcher = AlertDispatcher::new(table(), Duration::from_secs(5));
        let base = Instant::now();
        let absent = missing(&["helmet"]);

        assert!(dispatcher.maybe_alert(&absent, base).is_some());
        assert!(dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(3))
            .is_none());
        assert!(dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(6))
            .is_some());
    }

    #[test]
    fn suppressed_cycle_does_not_restart_cooldown() {
        let mut dispatcher = AlertDispatcher::new(table(), Duration::from_secs(5));
        let base = Instant::now();
        let absent = missing(&["vest"]);

        assert!(dispatcher.maybe_alert(&absent, base).is_some());
        // Suppressed at t=4; the window still measures from t=0.
        assert!(dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(4))
            .is_none());
        assert!(dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(6))
            .is_some());
    }

    #[test]
    fn cooldown_gates_positive_messages_too() {
        let mut dispatcher = AlertDispatcher::new(table(), Duration::from_secs(5));
        let base = Instant::now();

        let first = dispatcher.maybe_alert(&[], base).expect("first all-clear");
        assert_eq!(first.severity, AlertSeverity::AllClear);
        assert!(dispatcher
            .maybe_alert(&[], base + Duration::from_secs(2))
            .is_none());
    }

    #[test]
    fn elapsed_exactly_cooldown_is_still_suppressed() {
        let mut dispatcher = AlertDispatcher::new(table(), Duration::from_secs(5));
        let base = Instant::now();
        let absent = missing(&["boots"]);

        assert!(dispatcher.maybe_alert(&absent, base).is_some());
        assert!(dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(5))
            .is_none());
    }

    #[test]
    fn strict_thresholds_get_violation_wording() {
        let mut dispatcher = AlertDispatcher::new(table(), Duration::ZERO);
        let msg = dispatcher
            .maybe_alert(&missing(&["helmet", "vest"]), Instant::now())
            .unwrap();

        assert_eq!(msg.severity, AlertSeverity::Violation);
        assert_eq!(msg.text, "Safety violation! Confirmed missing: helmet, vest");
    }

    #[test]
    fn lax_thresholds_get_possibly_missing_wording() {
        let lax = RequirementTable::new(vec![
            Requirement {
                label: "helmet".into(),
                min_confidence: 0.7,
                color: [0, 255, 0],
            },
            Requirement {
                label: "gloves".into(),
                min_confidence: 0.5,
                color: [0, 255, 0],
            },
        ])
        .unwrap();
        let mut dispatcher = AlertDispatcher::new(lax, Duration::ZERO);

        // Both items are missing, but only the lax-threshold one is read out.
        let msg = dispatcher
            .maybe_alert(&missing(&["helmet", "gloves"]), Instant::now())
            .unwrap();
        assert_eq!(msg.severity, AlertSeverity::PossiblyMissing);
        assert_eq!(msg.text, "Warning! Possibly missing: gloves (low confidence)");
    }

    #[test]
    fn default_table_boundary_thresholds_are_not_lax() {
        // gloves/boots sit exactly at the 0.6 cutoff; the comparison is
        // strict, so they phrase as confirmed missing.
        let mut dispatcher = AlertDispatcher::new(table(), Duration::ZERO);
        let msg = dispatcher
            .maybe_alert(&missing(&["gloves", "boots"]), Instant::now())
            .unwrap();
        assert_eq!(msg.severity, AlertSeverity::Violation);
    }
}
