use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};

use crate::clock::CLOCK_TICK_MS;
use crate::countdown::{COUNTDOWN_TICK_MS, CountdownComponent};
use crate::hub::TimeHub;
use crate::pomodoro::POMODORO_TICK_MS;
use crate::stopwatch::{STOPWATCH_TICK_MS, StopwatchComponent};
use crate::time_provider::{TimeProvider, clamp_ms_to_i64, millis_between, offset_millis};

/// Cadence multipliers applied in turn, so the benchmark polls like a
/// throttled scheduler.
const JITTER_PATTERN: [u32; 6] = [1, 3, 1, 7, 2, 13];

pub const MAX_BENCH_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct DriftReport {
    pub ticks: u64,
    pub max_lateness_ms: i64,
    pub drift_ms: i64,
    pub naive_drift_ms: i64,
}

impl DriftReport {
    fn record_lateness(&mut self, due: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        if let Some(due) = due {
            self.max_lateness_ms = self.max_lateness_ms.max(millis_between(now, due));
        }
    }
}

pub struct BenchmarkSummary {
    pub countdown: DriftReport,
    pub stopwatch: DriftReport,
}

pub fn run_diagnostics(
    hub: &TimeHub,
    provider: &dyn TimeProvider,
    prefs_path: &Path,
    bench_ms: u64,
) -> Result<()> {
    let clock = hub.clock();
    println!("TimeHub diagnostics");
    println!("Time source: {}", provider.label());
    println!(
        "Selected time zone: {} ({})",
        clock.zone().label,
        clock.zone().zone_id
    );
    if let Some(reason) = hub.zone_fallback() {
        println!("Fallback reason: {reason}");
    }
    println!(
        "Clock: {}  {}  [{}]",
        clock.reading().time_text,
        clock.reading().date_text,
        if clock.use_24h() { "24-hour" } else { "12-hour" }
    );
    println!("Preference file: {}", prefs_path.display());
    println!(
        "Tick cadence (ms): clock {CLOCK_TICK_MS}, pomodoro {POMODORO_TICK_MS}, timer {COUNTDOWN_TICK_MS}, stopwatch {STOPWATCH_TICK_MS}"
    );

    println!("Running {bench_ms} ms drift benchmark...");
    let summary = run_drift_benchmark(provider, Duration::from_millis(bench_ms))?;
    println!("Benchmark summary:");
    print_report("Timer", &summary.countdown, COUNTDOWN_TICK_MS);
    print_report("Stopwatch", &summary.stopwatch, STOPWATCH_TICK_MS);
    Ok(())
}

fn print_report(label: &str, report: &DriftReport, cadence_ms: u64) {
    println!("  {label}:");
    println!("    Ticks: {}", report.ticks);
    println!("    Max lateness: {} ms", report.max_lateness_ms);
    println!(
        "    Anchored drift: {} ms (cadence {cadence_ms} ms)",
        report.drift_ms
    );
    println!("    Per-tick subtraction drift: {} ms", report.naive_drift_ms);
}

/// Polls a countdown and a stopwatch against the real clock on a jittered
/// schedule, comparing anchored time with per-tick accumulation.
pub fn run_drift_benchmark(
    provider: &dyn TimeProvider,
    length: Duration,
) -> Result<BenchmarkSummary> {
    if length.is_zero() {
        bail!("benchmark length must be greater than zero");
    }
    if length > Duration::from_millis(MAX_BENCH_MS) {
        bail!("benchmark length must be at most {MAX_BENCH_MS} ms");
    }

    let countdown_total_ms = u64::try_from(length.as_millis())
        .unwrap_or(u64::MAX)
        .saturating_add(60_000);
    let total_secs = i64::try_from(countdown_total_ms / 1_000).unwrap_or(i64::MAX);
    let mut countdown = CountdownComponent::new();
    countdown.set_duration(0, 0, total_secs);
    let initial_remaining = countdown.remaining_ms();
    let mut stopwatch = StopwatchComponent::new();

    let start = provider.now();
    countdown.start(start);
    stopwatch.start(start);

    let mut countdown_report = DriftReport::default();
    let mut stopwatch_report = DriftReport::default();
    let mut naive_remaining = clamp_ms_to_i64(initial_remaining);
    let mut naive_elapsed = 0_i64;
    let mut last_countdown_tick = start;
    let mut last_stopwatch_tick = start;

    let base_step = Duration::from_millis(STOPWATCH_TICK_MS);
    let spin = spin_window(STOPWATCH_TICK_MS);
    let bench_start = Instant::now();
    let bench_end = bench_start + length;
    let mut next_wake = bench_start;
    let mut frame = 0_usize;
    while Instant::now() < bench_end {
        next_wake += base_step * JITTER_PATTERN[frame % JITTER_PATTERN.len()];
        frame += 1;
        sleep_until(next_wake, spin);

        let now = provider.now();
        let countdown_due = countdown.next_due();
        if countdown.tick(now) {
            bail!("benchmark countdown expired early");
        }
        if countdown.next_due() != countdown_due {
            countdown_report.record_lateness(countdown_due, now);
            countdown_report.ticks += 1;
            naive_remaining -= clamp_ms_to_i64(COUNTDOWN_TICK_MS);
            last_countdown_tick = now;
        }

        let stopwatch_due = stopwatch.next_due();
        if stopwatch.tick(now) {
            stopwatch_report.record_lateness(stopwatch_due, now);
            stopwatch_report.ticks += 1;
            naive_elapsed += clamp_ms_to_i64(STOPWATCH_TICK_MS);
            last_stopwatch_tick = now;
        }
    }

    let anchor_end = offset_millis(start, clamp_ms_to_i64(initial_remaining));
    let countdown_expected = millis_between(anchor_end, last_countdown_tick);
    let countdown_actual = clamp_ms_to_i64(countdown.remaining_ms());
    countdown_report.drift_ms = countdown_actual - countdown_expected;
    countdown_report.naive_drift_ms = naive_remaining - countdown_expected;

    let stopwatch_expected = millis_between(last_stopwatch_tick, start);
    let stopwatch_actual = clamp_ms_to_i64(stopwatch.elapsed_ms());
    stopwatch_report.drift_ms = stopwatch_actual - stopwatch_expected;
    stopwatch_report.naive_drift_ms = naive_elapsed - stopwatch_expected;

    Ok(BenchmarkSummary {
        countdown: countdown_report,
        stopwatch: stopwatch_report,
    })
}

/// Sleeps until `deadline`, yielding through the final `spin` so the
/// wake-up lands on the tick boundary rather than a scheduler quantum later.
pub fn sleep_until(deadline: Instant, spin: Duration) {
    let coarse_deadline = deadline.checked_sub(spin).unwrap_or(deadline);
    let now = Instant::now();
    if coarse_deadline > now {
        std::thread::sleep(coarse_deadline - now);
    }
    while Instant::now() < deadline {
        std::thread::yield_now();
    }
}

/// A twentieth of the cadence, never below 50 us.
fn spin_window(cadence_ms: u64) -> Duration {
    (Duration::from_millis(cadence_ms) / 20).max(Duration::from_micros(50))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_provider::SystemTimeProvider;

    #[test]
    fn anchored_timers_do_not_drift() {
        let summary = run_drift_benchmark(&SystemTimeProvider, Duration::from_millis(300))
            .expect("benchmark");
        assert!(summary.countdown.ticks > 0);
        assert!(summary.stopwatch.ticks > 0);
        assert_eq!(summary.countdown.drift_ms, 0);
        assert_eq!(summary.stopwatch.drift_ms, 0);
        assert!(summary.stopwatch.naive_drift_ms < 0);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(run_drift_benchmark(&SystemTimeProvider, Duration::ZERO).is_err());
    }

    #[test]
    fn overlong_length_is_rejected_without_running() {
        let err = run_drift_benchmark(&SystemTimeProvider, Duration::MAX)
            .err()
            .expect("should fail");
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn sleep_until_reaches_deadline() {
        let deadline = Instant::now() + Duration::from_millis(5);
        sleep_until(deadline, spin_window(STOPWATCH_TICK_MS));
        assert!(Instant::now() >= deadline);
        assert_eq!(spin_window(10), Duration::from_micros(500));
        assert_eq!(spin_window(0), Duration::from_micros(50));
    }
}
