use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::format::format_duration;
use crate::ticker::Ticker;
use crate::time_provider::{clamp_ms_to_i64, millis_between, offset_millis};

pub const COUNTDOWN_TICK_MS: u64 = 100;
/// 99:59:59, the largest duration the form can express.
pub const MAX_COUNTDOWN_SECS: u64 = 99 * 3_600 + 59 * 60 + 59;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountdownState {
    Unset,
    Set,
    Running,
    Expired,
}

pub struct CountdownComponent {
    state: CountdownState,
    total_ms: u64,
    remaining_ms: u64,
    anchor_end: Option<DateTime<Utc>>,
    ticker: Ticker,
}

impl Default for CountdownComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownComponent {
    pub fn new() -> Self {
        Self {
            state: CountdownState::Unset,
            total_ms: 0,
            remaining_ms: 0,
            anchor_end: None,
            ticker: Ticker::new(COUNTDOWN_TICK_MS),
        }
    }

    /// Signs are stripped from every field and the total is capped at
    /// 99:59:59. A zero total is rejected, as is any change while the
    /// countdown runs.
    pub fn set_duration(&mut self, hours: i64, minutes: i64, seconds: i64) -> bool {
        if self.state == CountdownState::Running {
            return false;
        }
        let total_secs = hours
            .unsigned_abs()
            .saturating_mul(3_600)
            .saturating_add(minutes.unsigned_abs().saturating_mul(60))
            .saturating_add(seconds.unsigned_abs())
            .min(MAX_COUNTDOWN_SECS);
        if total_secs == 0 {
            debug!("ignoring zero countdown duration");
            return false;
        }

        self.total_ms = total_secs.saturating_mul(1_000);
        self.remaining_ms = self.total_ms;
        self.state = CountdownState::Set;
        info!(total_ms = self.total_ms, "countdown set");
        true
    }

    pub fn set_from_input(&mut self, input: &DurationInput) -> bool {
        self.set_duration(
            clamp_ms_to_i64(input.hours),
            clamp_ms_to_i64(input.minutes),
            clamp_ms_to_i64(input.seconds),
        )
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != CountdownState::Set || self.remaining_ms == 0 {
            return false;
        }
        self.anchor_end = Some(offset_millis(now, clamp_ms_to_i64(self.remaining_ms)));
        self.ticker.start(now);
        self.state = CountdownState::Running;
        info!(remaining_ms = self.remaining_ms, "countdown started");
        true
    }

    pub fn pause(&mut self) {
        if self.state != CountdownState::Running {
            return;
        }
        self.ticker.cancel();
        self.anchor_end = None;
        self.state = CountdownState::Set;
        info!(remaining_ms = self.remaining_ms, "countdown paused");
    }

    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.anchor_end = None;
        self.total_ms = 0;
        self.remaining_ms = 0;
        self.state = CountdownState::Unset;
        info!("countdown reset");
    }

    /// Returns true on the tick that reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let Some(anchor_end) = self.anchor_end else {
            return false;
        };
        if !self.ticker.poll(now) {
            return false;
        }

        let left = millis_between(anchor_end, now);
        if left > 0 {
            self.remaining_ms = left.unsigned_abs();
            return false;
        }

        self.remaining_ms = 0;
        self.ticker.cancel();
        self.anchor_end = None;
        self.state = CountdownState::Expired;
        info!(total_ms = self.total_ms, "countdown expired");
        true
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn display(&self) -> String {
        format_duration(self.remaining_ms, false)
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.ticker.next_due()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DurationField {
    Hours,
    Minutes,
    Seconds,
}

impl DurationField {
    pub const ALL: [DurationField; 3] = [
        DurationField::Hours,
        DurationField::Minutes,
        DurationField::Seconds,
    ];

    pub fn max(self) -> u64 {
        match self {
            DurationField::Hours => 99,
            DurationField::Minutes | DurationField::Seconds => 59,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationField::Hours => "h",
            DurationField::Minutes => "m",
            DurationField::Seconds => "s",
        }
    }
}

/// The hours/minutes/seconds form that feeds `set_duration`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct DurationInput {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationInput {
    pub fn parse(hours: &str, minutes: &str, seconds: &str) -> Self {
        Self {
            hours: coerce_field(hours),
            minutes: coerce_field(minutes),
            seconds: coerce_field(seconds),
        }
    }

    pub fn get(&self, field: DurationField) -> u64 {
        match field {
            DurationField::Hours => self.hours,
            DurationField::Minutes => self.minutes,
            DurationField::Seconds => self.seconds,
        }
    }

    /// Step a field up or down, clamped to the field's range.
    pub fn adjust(&mut self, field: DurationField, delta: i64) {
        let current = clamp_ms_to_i64(self.get(field));
        let max = clamp_ms_to_i64(field.max());
        let next = current.saturating_add(delta).clamp(0, max).unsigned_abs();
        match field {
            DurationField::Hours => self.hours = next,
            DurationField::Minutes => self.minutes = next,
            DurationField::Seconds => self.seconds = next,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Leading integer of a form field with its sign dropped. Anything without
/// leading digits counts as zero.
pub fn coerce_field(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    unsigned
        .chars()
        .map_while(|ch| ch.to_digit(10))
        .fold(0_u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        })
}
