//! Anti-cheat integrity monitoring.
//!
//! Policy is zero tolerance: the first accepted signal terminates the attempt
//! outright. There is no warning tier here, unlike the timer's graduated
//! warnings.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// What tripped the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityCause {
    FocusLost,
    DevtoolsDetected,
    ContextMenu,
}

impl fmt::Display for IntegrityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FocusLost => write!(f, "window focus lost"),
            Self::DevtoolsDetected => write!(f, "developer tools detected"),
            Self::ContextMenu => write!(f, "context menu opened"),
        }
    }
}

/// A single accepted violation; the session machine treats it as terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub cause: IntegrityCause,
    pub observed_at: DateTime<Utc>,
}

/// Default per-cause debounce window, in seconds.
pub const DEFAULT_DEBOUNCE_SECS: i64 = 2;

/// Converts raw environment signals into at most one violation.
///
/// Rapid repeated signals from the same cause (blur/focus flapping) inside the
/// debounce window are dropped, but the first valid signal is always
/// authoritative. Once a violation has been accepted, or the monitor is
/// disarmed, every further signal is a no-op.
#[derive(Debug, Clone)]
pub struct IntegrityMonitor {
    armed: bool,
    debounce: Duration,
    last_signal: Vec<(IntegrityCause, DateTime<Utc>)>,
    violation: Option<IntegrityViolation>,
}

impl IntegrityMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_debounce(Duration::seconds(DEFAULT_DEBOUNCE_SECS))
    }

    #[must_use]
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            armed: false,
            debounce,
            last_signal: Vec::new(),
            violation: None,
        }
    }

    /// Start treating signals as violations. Idempotent.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Stop treating signals as violations. Idempotent.
    ///
    /// Called on termination, submission, or navigation away.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// The accepted violation, if one has occurred.
    #[must_use]
    pub fn violation(&self) -> Option<&IntegrityViolation> {
        self.violation.as_ref()
    }

    /// Feed one raw signal into the monitor.
    ///
    /// Returns the violation only on the signal that caused it; duplicates,
    /// debounced repeats, disarmed observations, and anything after the first
    /// accepted violation return `None`.
    pub fn observe(
        &mut self,
        cause: IntegrityCause,
        at: DateTime<Utc>,
    ) -> Option<IntegrityViolation> {
        if self.violation.is_some() {
            return None;
        }

        let duplicate = self
            .last_signal
            .iter()
            .any(|(c, seen)| *c == cause && at - *seen < self.debounce);
        if duplicate {
            return None;
        }

        match self.last_signal.iter_mut().find(|(c, _)| *c == cause) {
            Some(entry) => entry.1 = at,
            None => self.last_signal.push((cause, at)),
        }

        if !self.armed {
            return None;
        }

        let violation = IntegrityViolation {
            cause,
            observed_at: at,
        };
        self.violation = Some(violation.clone());
        Some(violation)
    }
}

impl Default for IntegrityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn first_signal_while_armed_is_terminal() {
        let mut monitor = IntegrityMonitor::new();
        monitor.arm();

        let violation = monitor.observe(IntegrityCause::FocusLost, fixed_now());
        assert_eq!(violation.unwrap().cause, IntegrityCause::FocusLost);
        assert!(monitor.violation().is_some());
    }

    #[test]
    fn signals_after_a_violation_are_no_ops() {
        let now = fixed_now();
        let mut monitor = IntegrityMonitor::new();
        monitor.arm();
        monitor.observe(IntegrityCause::DevtoolsDetected, now).unwrap();

        assert!(monitor
            .observe(IntegrityCause::FocusLost, now + Duration::seconds(10))
            .is_none());
        assert_eq!(
            monitor.violation().unwrap().cause,
            IntegrityCause::DevtoolsDetected
        );
    }

    #[test]
    fn disarmed_monitor_records_nothing_terminal() {
        let mut monitor = IntegrityMonitor::new();
        assert!(monitor.observe(IntegrityCause::ContextMenu, fixed_now()).is_none());
        assert!(monitor.violation().is_none());
    }

    #[test]
    fn rapid_repeats_of_the_same_cause_are_debounced() {
        let now = fixed_now();
        let mut monitor = IntegrityMonitor::new();

        // Blur/focus flapping before the session arms the monitor.
        assert!(monitor.observe(IntegrityCause::FocusLost, now).is_none());
        monitor.arm();
        assert!(monitor
            .observe(IntegrityCause::FocusLost, now + Duration::seconds(1))
            .is_none());

        // Outside the window the same cause is a fresh signal.
        let violation = monitor.observe(IntegrityCause::FocusLost, now + Duration::seconds(3));
        assert!(violation.is_some());
    }

    #[test]
    fn different_causes_are_not_debounced_together() {
        let now = fixed_now();
        let mut monitor = IntegrityMonitor::new();
        monitor.observe(IntegrityCause::FocusLost, now);
        monitor.arm();

        let violation = monitor.observe(IntegrityCause::ContextMenu, now);
        assert!(violation.is_some());
    }
}
