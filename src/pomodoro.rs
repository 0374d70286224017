use chrono::{DateTime, Utc};
use tracing::info;

use crate::format::format_duration;
use crate::ticker::Ticker;
use crate::time_provider::{clamp_ms_to_i64, millis_between, offset_millis};

const MINUTE_MS: u64 = 60_000;

pub const WORK_MS: u64 = 25 * MINUTE_MS;
pub const BREAK_MS: u64 = 5 * MINUTE_MS;
pub const LONG_BREAK_MS: u64 = 15 * MINUTE_MS;
pub const WORK_LAPS_PER_LONG_BREAK: u32 = 4;
pub const POMODORO_TICK_MS: u64 = 100;
pub const MIN_ADJUST_MINUTES: i64 = 1;
pub const MAX_ADJUST_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    pub fn duration_ms(self) -> u64 {
        match self {
            Phase::Work => WORK_MS,
            Phase::Break => BREAK_MS,
            Phase::LongBreak => LONG_BREAK_MS,
        }
    }

    pub fn status_label(self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::Break | Phase::LongBreak => "Break Time",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
            Phase::LongBreak => "long_break",
        }
    }
}

/// A finished phase and the phase that was started in its place.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PhaseChange {
    pub finished: Phase,
    pub next: Phase,
    pub work_laps_completed: u32,
}

pub struct PomodoroComponent {
    phase: Phase,
    work_laps_completed: u32,
    remaining_ms: u64,
    anchor_end: Option<DateTime<Utc>>,
    ticker: Ticker,
}

impl Default for PomodoroComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl PomodoroComponent {
    pub fn new() -> Self {
        Self {
            phase: Phase::Work,
            work_laps_completed: 0,
            remaining_ms: WORK_MS,
            anchor_end: None,
            ticker: Ticker::new(POMODORO_TICK_MS),
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor_end.is_some()
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.is_running() {
            return;
        }
        self.anchor_end = Some(offset_millis(now, clamp_ms_to_i64(self.remaining_ms)));
        self.ticker.start(now);
        info!(
            phase = self.phase.as_str(),
            remaining_ms = self.remaining_ms,
            "pomodoro started"
        );
    }

    /// Keeps the remaining time exactly as the last tick computed it.
    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        self.ticker.cancel();
        self.anchor_end = None;
        info!(
            phase = self.phase.as_str(),
            remaining_ms = self.remaining_ms,
            "pomodoro paused"
        );
    }

    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.anchor_end = None;
        self.phase = Phase::Work;
        self.remaining_ms = WORK_MS;
        self.work_laps_completed = 0;
        info!("pomodoro reset");
    }

    /// Shifts the paused remaining time by whole minutes within [1, 60].
    /// Ignored while running.
    pub fn adjust_remaining(&mut self, delta_minutes: i64) -> bool {
        if self.is_running() {
            return false;
        }
        let minutes = clamp_ms_to_i64(self.remaining_ms / MINUTE_MS);
        let adjusted = minutes
            .saturating_add(delta_minutes)
            .clamp(MIN_ADJUST_MINUTES, MAX_ADJUST_MINUTES);
        self.remaining_ms = adjusted.unsigned_abs() * MINUTE_MS;
        true
    }

    /// Recomputes the remaining time from the anchor when a tick is due.
    /// On expiry the next phase is started from `now` and the change returned.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<PhaseChange> {
        let anchor_end = self.anchor_end?;
        if !self.ticker.poll(now) {
            return None;
        }

        let left = millis_between(anchor_end, now);
        if left > 0 {
            self.remaining_ms = left.unsigned_abs();
            return None;
        }

        self.remaining_ms = 0;
        self.ticker.cancel();
        self.anchor_end = None;
        let change = self.advance_phase();
        info!(
            finished = change.finished.as_str(),
            next = change.next.as_str(),
            work_laps = change.work_laps_completed,
            "pomodoro phase complete"
        );
        self.start(now);
        Some(change)
    }

    fn advance_phase(&mut self) -> PhaseChange {
        let finished = self.phase;
        let next = match finished {
            Phase::Work => {
                self.work_laps_completed += 1;
                if self.work_laps_completed % WORK_LAPS_PER_LONG_BREAK == 0 {
                    Phase::LongBreak
                } else {
                    Phase::Break
                }
            }
            Phase::Break | Phase::LongBreak => Phase::Work,
        };
        self.phase = next;
        self.remaining_ms = next.duration_ms();
        PhaseChange {
            finished,
            next,
            work_laps_completed: self.work_laps_completed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn work_laps_completed(&self) -> u32 {
        self.work_laps_completed
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
