use chrono::{DateTime, Utc};

use crate::time_provider::{clamp_ms_to_i64, millis_between, offset_millis};

/// A cancellable recurring tick with a fixed cadence.
///
/// The poll loop hands every ticker the same freshly read instant. A ticker
/// that fell behind fires once and skips the backlog, so ticks of one
/// component never overlap or queue up.
#[derive(Debug, Clone)]
pub struct Ticker {
    cadence_ms: u64,
    next_due: Option<DateTime<Utc>>,
}

impl Ticker {
    pub const fn new(cadence_ms: u64) -> Self {
        Self {
            cadence_ms,
            next_due: None,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(offset_millis(now, self.cadence()));
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// Returns true when a tick is due at `now` and schedules the next one.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        let cadence = self.cadence();

        if now < due {
            // Host clock stepped backwards past a whole cadence.
            if millis_between(due, now) > cadence {
                self.next_due = Some(offset_millis(now, cadence));
                return true;
            }
            return false;
        }

        let behind = millis_between(now, due);
        let skipped = behind / cadence;
        self.next_due = Some(offset_millis(due, (skipped + 1).saturating_mul(cadence)));
        true
    }

    fn cadence(&self) -> i64 {
        clamp_ms_to_i64(self.cadence_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_provider::testing::at;

    #[test]
    fn inactive_ticker_never_fires() {
        let mut ticker = Ticker::new(100);
        assert!(!ticker.is_active());
        assert!(!ticker.poll(at(10_000)));
    }

    #[test]
    fn fires_once_per_cadence() {
        let mut ticker = Ticker::new(100);
        ticker.start(at(0));
        assert!(!ticker.poll(at(50)));
        assert!(ticker.poll(at(100)));
        assert!(!ticker.poll(at(150)));
        assert!(ticker.poll(at(210)));
        assert_eq!(ticker.next_due(), Some(at(300)));
    }

    #[test]
    fn backlog_coalesces_into_single_tick() {
        let mut ticker = Ticker::new(100);
        ticker.start(at(0));
        assert!(ticker.poll(at(1_050)));
        assert_eq!(ticker.next_due(), Some(at(1_100)));
        assert!(!ticker.poll(at(1_060)));
    }

    #[test]
    fn backwards_clock_step_reschedules() {
        let mut ticker = Ticker::new(1_000);
        ticker.start(at(60_000));
        assert!(ticker.poll(at(5_000)));
        assert_eq!(ticker.next_due(), Some(at(6_000)));
    }

    #[test]
    fn cancel_stops_ticks() {
        let mut ticker = Ticker::new(10);
        ticker.start(at(0));
        ticker.cancel();
        assert!(!ticker.poll(at(100)));
        assert_eq!(ticker.next_due(), None);
    }
}
