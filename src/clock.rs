use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use tracing::{debug, info};

use crate::ticker::Ticker;
use crate::zones::{TimeZoneSpec, resolve_zone};

pub const CLOCK_TICK_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClockState {
    Stopped,
    Ticking,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ClockReading {
    pub time_text: String,
    pub date_text: String,
}

pub struct ClockComponent {
    ticker: Ticker,
    zone: &'static TimeZoneSpec,
    use_24h: bool,
    reading: ClockReading,
}

impl ClockComponent {
    pub fn new(zone: &'static TimeZoneSpec) -> Self {
        Self {
            ticker: Ticker::new(CLOCK_TICK_MS),
            zone,
            use_24h: true,
            reading: ClockReading::default(),
        }
    }

    pub fn state(&self) -> ClockState {
        if self.ticker.is_active() {
            ClockState::Ticking
        } else {
            ClockState::Stopped
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.state() == ClockState::Stopped {
            self.ticker.start(now);
            debug!(zone = self.zone.zone_id, "clock ticking");
        }
        self.refresh(now);
    }

    pub fn stop(&mut self) {
        if self.state() == ClockState::Ticking {
            self.ticker.cancel();
            debug!("clock stopped");
        }
    }

    /// Recomputes the reading when the one-second tick is due.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.ticker.poll(now) {
            return false;
        }
        self.refresh(now);
        true
    }

    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let wall = self.zone.wall_time(now);
        self.reading = ClockReading {
            time_text: format_wall_time(&wall, self.use_24h),
            date_text: format_wall_date(&wall),
        };
    }

    /// Switches zone and refreshes at once. Unknown ids fall back to local time.
    pub fn set_time_zone(&mut self, zone_id: &str, now: DateTime<Utc>) -> &'static TimeZoneSpec {
        let selection = resolve_zone(zone_id);
        if let Some(reason) = selection.fallback_reason.as_deref() {
            info!(%reason, "time zone fallback");
        }
        self.zone = selection.zone;
        self.refresh(now);
        self.zone
    }

    pub fn set_hour_format(&mut self, use_24h: bool, now: DateTime<Utc>) {
        self.use_24h = use_24h;
        self.refresh(now);
    }

    pub fn zone(&self) -> &'static TimeZoneSpec {
        self.zone
    }

    pub fn use_24h(&self) -> bool {
        self.use_24h
    }

    pub fn reading(&self) -> &ClockReading {
        &self.reading
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.ticker.next_due()
    }
}

pub fn format_wall_time(wall: &NaiveDateTime, use_24h: bool) -> String {
    let (hour, suffix) = if use_24h {
        (wall.hour(), "")
    } else {
        let (is_pm, hour12) = wall.hour12();
        (hour12, if is_pm { " PM" } else { " AM" })
    };
    format!(
        "{hour:02}:{:02}:{:02}{suffix}",
        wall.minute(),
        wall.second()
    )
}

pub fn format_wall_date(wall: &NaiveDateTime) -> String {
    wall.format("%A, %B %-d, %Y").to_string()
}
