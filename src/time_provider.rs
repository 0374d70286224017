use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current wall-clock instant.
///
/// Every poll reads a fresh instant. Nothing downstream extrapolates from an
/// older sample, so external clock adjustments show up on the next poll.
pub trait TimeProvider {
    fn now(&self) -> DateTime<Utc>;
    fn label(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn label(&self) -> &'static str {
        "SYSTEM_WALL_CLOCK"
    }
}

/// Signed whole milliseconds from `earlier` to `later`.
pub fn millis_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later - earlier).num_milliseconds()
}

/// `at` shifted by `ms`, pinned to the representable range instead of
/// overflowing.
pub fn offset_millis(at: DateTime<Utc>, ms: i64) -> DateTime<Utc> {
    TimeDelta::try_milliseconds(ms)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(if ms < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

pub fn clamp_ms_to_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, TimeZone, Utc};

    /// Fixed instant plus `ms` milliseconds, for deterministic timing tests.
    pub fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_760_000_000_000 + ms)
            .single()
            .expect("valid test instant")
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::testing::at;
    use super::*;

    #[test]
    fn system_provider_tracks_wall_clock() {
        let provider = SystemTimeProvider;
        let first = provider.now();
        thread::sleep(Duration::from_millis(2));
        let second = provider.now();
        assert!(second >= first);
        assert_eq!(provider.label(), "SYSTEM_WALL_CLOCK");
    }

    #[test]
    fn millis_between_is_signed() {
        assert_eq!(millis_between(at(1_500), at(1_000)), 500);
        assert_eq!(millis_between(at(1_000), at(1_500)), -500);
        assert_eq!(offset_millis(at(0), 250), at(250));
    }

    #[test]
    fn offset_past_the_calendar_saturates() {
        assert_eq!(offset_millis(at(0), i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(offset_millis(at(0), i64::MIN), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn oversized_millis_saturate() {
        assert_eq!(clamp_ms_to_i64(u64::MAX), i64::MAX);
        assert_eq!(clamp_ms_to_i64(42), 42);
    }
}
