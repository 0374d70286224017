use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::ClockComponent;
use crate::countdown::CountdownComponent;
use crate::pomodoro::PomodoroComponent;
use crate::stopwatch::StopwatchComponent;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Mode {
    Clock,
    Pomodoro,
    Timer,
    Stopwatch,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Clock, Mode::Pomodoro, Mode::Timer, Mode::Stopwatch];

    pub fn id(self) -> &'static str {
        match self {
            Mode::Clock => "clock",
            Mode::Pomodoro => "pomodoro",
            Mode::Timer => "timer",
            Mode::Stopwatch => "stopwatch",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|mode| mode.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::Clock => "Clock",
            Mode::Pomodoro => "Pomodoro",
            Mode::Timer => "Timer",
            Mode::Stopwatch => "Stopwatch",
        }
    }
}

/// The four timing components of one widget instance.
pub struct Components {
    pub clock: ClockComponent,
    pub pomodoro: PomodoroComponent,
    pub countdown: CountdownComponent,
    pub stopwatch: StopwatchComponent,
}

/// Tracks the single active mode. Components are only touched through
/// their own start/stop/pause operations.
#[derive(Debug)]
pub struct ModeController {
    active: Mode,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            active: Mode::Clock,
        }
    }

    pub fn active(&self) -> Mode {
        self.active
    }

    /// Suspends the outgoing mode, then brings `target` up to date. Returns
    /// true when the active mode changed.
    pub fn activate(
        &mut self,
        target: Mode,
        components: &mut Components,
        now: DateTime<Utc>,
    ) -> bool {
        let previous = self.active;
        let switched = previous != target;
        if switched {
            suspend(previous, components);
            self.active = target;
            info!(from = previous.id(), to = target.id(), "mode switched");
        }
        resume(target, components, now);
        switched
    }

    /// Unknown identifiers are ignored.
    pub fn activate_id(
        &mut self,
        id: &str,
        components: &mut Components,
        now: DateTime<Utc>,
    ) -> bool {
        match Mode::from_id(id) {
            Some(mode) => self.activate(mode, components, now),
            None => {
                debug!(id, "ignoring unknown mode");
                false
            }
        }
    }
}

fn suspend(mode: Mode, components: &mut Components) {
    match mode {
        Mode::Clock => components.clock.stop(),
        Mode::Pomodoro => components.pomodoro.pause(),
        Mode::Timer => components.countdown.pause(),
        Mode::Stopwatch => components.stopwatch.pause(),
    }
}

fn resume(mode: Mode, components: &mut Components, now: DateTime<Utc>) {
    // Timer displays are pure functions of component state; only the clock
    // needs a fresh reading and its tick back.
    if mode == Mode::Clock {
        components.clock.start(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockState;
    use crate::pomodoro::WORK_MS;
    use crate::time_provider::testing::at;
    use crate::zones::local_zone;

    fn components() -> Components {
        Components {
            clock: ClockComponent::new(local_zone()),
            pomodoro: PomodoroComponent::new(),
            countdown: CountdownComponent::new(),
            stopwatch: StopwatchComponent::new(),
        }
    }

    #[test]
    fn mode_ids_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_id(mode.id()), Some(mode));
        }
        assert_eq!(Mode::from_id("alarm"), None);
    }

    #[test]
    fn starts_in_clock_mode() {
        assert_eq!(ModeController::new().active(), Mode::Clock);
    }

    #[test]
    fn leaving_clock_stops_its_tick() {
        let mut controller = ModeController::new();
        let mut parts = components();
        controller.activate(Mode::Clock, &mut parts, at(0));
        assert_eq!(parts.clock.state(), ClockState::Ticking);

        assert!(controller.activate(Mode::Stopwatch, &mut parts, at(10)));
        assert_eq!(parts.clock.state(), ClockState::Stopped);

        controller.activate(Mode::Clock, &mut parts, at(20));
        assert_eq!(parts.clock.state(), ClockState::Ticking);
    }

    #[test]
    fn switching_away_pauses_pomodoro_without_reset() {
        let mut controller = ModeController::new();
        let mut parts = components();
        controller.activate(Mode::Pomodoro, &mut parts, at(0));
        parts.pomodoro.start(at(0));
        parts.pomodoro.tick(at(42_000));
        let remaining_at_switch = parts.pomodoro.remaining_ms();

        controller.activate(Mode::Stopwatch, &mut parts, at(42_050));
        assert!(!parts.pomodoro.is_running());
        parts.pomodoro.tick(at(600_000));

        controller.activate(Mode::Pomodoro, &mut parts, at(600_000));
        assert!(!parts.pomodoro.is_running());
        assert_eq!(parts.pomodoro.remaining_ms(), remaining_at_switch);
        assert_eq!(remaining_at_switch, WORK_MS - 42_000);
    }

    #[test]
    fn switching_away_pauses_countdown_and_stopwatch() {
        let mut controller = ModeController::new();
        let mut parts = components();

        controller.activate(Mode::Timer, &mut parts, at(0));
        parts.countdown.set_duration(0, 1, 0);
        parts.countdown.start(at(0));
        controller.activate(Mode::Stopwatch, &mut parts, at(100));
        assert!(!parts.countdown.is_running());

        parts.stopwatch.start(at(100));
        controller.activate(Mode::Clock, &mut parts, at(200));
        assert!(!parts.stopwatch.is_running());
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut controller = ModeController::new();
        let mut parts = components();
        controller.activate(Mode::Stopwatch, &mut parts, at(0));
        parts.stopwatch.start(at(0));
        assert!(!controller.activate_id("calendar", &mut parts, at(5)));
        assert_eq!(controller.active(), Mode::Stopwatch);
        assert!(parts.stopwatch.is_running());
        assert!(controller.activate_id("timer", &mut parts, at(6)));
        assert_eq!(controller.active(), Mode::Timer);
    }

    #[test]
    fn reactivating_same_mode_keeps_timer_running() {
        let mut controller = ModeController::new();
        let mut parts = components();
        controller.activate(Mode::Stopwatch, &mut parts, at(0));
        parts.stopwatch.start(at(0));
        assert!(!controller.activate(Mode::Stopwatch, &mut parts, at(50)));
        assert!(parts.stopwatch.is_running());
    }
}
