use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::format::format_duration;
use crate::ticker::Ticker;
use crate::time_provider::{clamp_ms_to_i64, millis_between, offset_millis};

pub const STOPWATCH_TICK_MS: u64 = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LapEntry {
    pub sequence: u32,
    pub since_last_ms: u64,
    pub total_ms: u64,
}

pub struct StopwatchComponent {
    anchor_start: Option<DateTime<Utc>>,
    elapsed_ms: u64,
    laps: VecDeque<LapEntry>,
    ticker: Ticker,
}

impl Default for StopwatchComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl StopwatchComponent {
    pub fn new() -> Self {
        Self {
            anchor_start: None,
            elapsed_ms: 0,
            laps: VecDeque::new(),
            ticker: Ticker::new(STOPWATCH_TICK_MS),
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor_start.is_some()
    }

    /// Resumes from the frozen elapsed time by back-dating the anchor.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.is_running() {
            return;
        }
        self.anchor_start = Some(offset_millis(now, -clamp_ms_to_i64(self.elapsed_ms)));
        self.ticker.start(now);
        info!(elapsed_ms = self.elapsed_ms, "stopwatch started");
    }

    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        self.ticker.cancel();
        self.anchor_start = None;
        info!(elapsed_ms = self.elapsed_ms, "stopwatch paused");
    }

    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.anchor_start = None;
        self.elapsed_ms = 0;
        self.laps.clear();
        info!("stopwatch reset");
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.ticker.poll(now) {
            return false;
        }
        self.refresh(now);
        true
    }

    /// Records a lap at `now`. Ignored unless running.
    pub fn lap(&mut self, now: DateTime<Utc>) -> Option<LapEntry> {
        if !self.is_running() {
            return None;
        }
        self.refresh(now);
        let previous_total = self.laps.front().map(|lap| lap.total_ms).unwrap_or(0);
        let entry = LapEntry {
            sequence: u32::try_from(self.laps.len() + 1).unwrap_or(u32::MAX),
            since_last_ms: self.elapsed_ms.saturating_sub(previous_total),
            total_ms: self.elapsed_ms,
        };
        self.laps.push_front(entry);
        debug!(
            sequence = entry.sequence,
            since_last_ms = entry.since_last_ms,
            total_ms = entry.total_ms,
            "lap recorded"
        );
        Some(entry)
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        if let Some(anchor) = self.anchor_start {
            self.elapsed_ms = millis_between(now, anchor).max(0).unsigned_abs();
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Newest lap first.
    pub fn laps(&self) -> impl Iterator<Item = &LapEntry> {
        self.laps.iter()
    }

    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }

    pub fn display(&self) -> String {
        format_duration(self.elapsed_ms, true)
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.ticker.next_due()
    }
}
