use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::chime::{CompletionSignal, fire_and_forget};
use crate::clock::ClockComponent;
use crate::countdown::CountdownComponent;
use crate::mode::{Components, Mode, ModeController};
use crate::pomodoro::{PhaseChange, PomodoroComponent};
use crate::prefs::{PreferenceStore, TIME_ZONE_KEY};
use crate::stopwatch::StopwatchComponent;
use crate::zones::{TimeZoneSpec, local_zone, resolve_zone};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PollOutcome {
    pub phase_change: Option<PhaseChange>,
    pub countdown_expired: bool,
}

/// One self-contained widget instance: the mode controller, its four
/// components, the preference store and the completion signal.
pub struct TimeHub {
    controller: ModeController,
    components: Components,
    prefs: Box<dyn PreferenceStore>,
    chime: Box<dyn CompletionSignal>,
    zone_fallback: Option<String>,
}

impl TimeHub {
    pub fn new(
        prefs: Box<dyn PreferenceStore>,
        chime: Box<dyn CompletionSignal>,
        now: DateTime<Utc>,
    ) -> Self {
        let (zone, zone_fallback) = match prefs.get(TIME_ZONE_KEY) {
            Some(saved) => {
                let selection = resolve_zone(&saved);
                if let Some(reason) = selection.fallback_reason.as_deref() {
                    warn!(%reason, "saved time zone not restored");
                }
                (selection.zone, selection.fallback_reason)
            }
            None => (local_zone(), None),
        };

        let mut hub = Self {
            controller: ModeController::new(),
            components: Components {
                clock: ClockComponent::new(zone),
                pomodoro: PomodoroComponent::new(),
                countdown: CountdownComponent::new(),
                stopwatch: StopwatchComponent::new(),
            },
            prefs,
            chime,
            zone_fallback,
        };
        hub.controller.activate(Mode::Clock, &mut hub.components, now);
        hub
    }

    pub fn active_mode(&self) -> Mode {
        self.controller.active()
    }

    pub fn activate(&mut self, mode: Mode, now: DateTime<Utc>) -> bool {
        self.controller.activate(mode, &mut self.components, now)
    }

    pub fn activate_id(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.controller.activate_id(id, &mut self.components, now)
    }

    /// Selects a clock zone and remembers it. Unknown ids resolve to local time.
    pub fn select_time_zone(
        &mut self,
        zone_id: &str,
        now: DateTime<Utc>,
    ) -> &'static TimeZoneSpec {
        let selection = resolve_zone(zone_id);
        self.zone_fallback = selection.fallback_reason;
        let zone = self.components.clock.set_time_zone(selection.zone.zone_id, now);
        self.prefs.set(TIME_ZONE_KEY, zone.zone_id);
        info!(zone = zone.zone_id, "time zone selected");
        zone
    }

    pub fn set_hour_format(&mut self, use_24h: bool, now: DateTime<Utc>) {
        self.components.clock.set_hour_format(use_24h, now);
    }

    /// Runs every due tick at `now` and fires one chime per completion.
    pub fn poll(&mut self, now: DateTime<Utc>) -> PollOutcome {
        self.components.clock.tick(now);
        self.components.stopwatch.tick(now);
        let outcome = PollOutcome {
            phase_change: self.components.pomodoro.tick(now),
            countdown_expired: self.components.countdown.tick(now),
        };

        if outcome.phase_change.is_some() {
            fire_and_forget(self.chime.as_ref(), "pomodoro phase complete");
        }
        if outcome.countdown_expired {
            fire_and_forget(self.chime.as_ref(), "countdown expired");
        }
        outcome
    }

    /// Earliest instant any running component wants its next tick.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        [
            self.components.clock.next_due(),
            self.components.pomodoro.next_due(),
            self.components.countdown.next_due(),
            self.components.stopwatch.next_due(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn zone_fallback(&self) -> Option<&str> {
        self.zone_fallback.as_deref()
    }

    pub fn clock(&self) -> &ClockComponent {
        &self.components.clock
    }

    pub fn pomodoro(&self) -> &PomodoroComponent {
        &self.components.pomodoro
    }

    pub fn pomodoro_mut(&mut self) -> &mut PomodoroComponent {
        &mut self.components.pomodoro
    }

    pub fn countdown(&self) -> &CountdownComponent {
        &self.components.countdown
    }

    pub fn countdown_mut(&mut self) -> &mut CountdownComponent {
        &mut self.components.countdown
    }

    pub fn stopwatch(&self) -> &StopwatchComponent {
        &self.components.stopwatch
    }

    pub fn stopwatch_mut(&mut self) -> &mut StopwatchComponent {
        &mut self.components.stopwatch
    }
}
