use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use eframe::egui::{
    self, Align, Color32, Layout, RichText, ScrollArea, TextEdit, TopBottomPanel, Ui,
};

use crate::countdown::{CountdownState, DurationField, DurationInput};
use crate::format::format_duration;
use crate::hub::{PollOutcome, TimeHub};
use crate::mode::Mode;
use crate::pomodoro::{MAX_ADJUST_MINUTES, MIN_ADJUST_MINUTES};
use crate::time_provider::{TimeProvider, millis_between};
use crate::zones::TIME_ZONES;

const STATUS_TTL: Duration = Duration::from_secs(3);

pub fn run_gui(hub: TimeHub, provider: Box<dyn TimeProvider>) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TimeHub")
            .with_inner_size([560.0, 520.0])
            .with_min_inner_size([420.0, 400.0]),
        ..Default::default()
    };

    let app = TimeHubApp::new(hub, provider);

    eframe::run_native(
        "TimeHub",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch TimeHub GUI: {err}"))?;

    Ok(())
}

const ACCENT: Color32 = Color32::from_rgb(242, 140, 82);
const READOUT: Color32 = Color32::from_rgb(250, 222, 170);

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(236, 232, 226));
    visuals.panel_fill = Color32::from_rgb(22, 20, 24);
    visuals.window_fill = Color32::from_rgb(30, 27, 32);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(44, 40, 46);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(66, 56, 60);
    visuals.widgets.active.bg_fill = ACCENT.gamma_multiply(0.7);
    visuals.selection.bg_fill = ACCENT;
    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    });
}

/// Raw text of the countdown form, coerced on every edit.
#[derive(Default)]
struct DurationForm {
    hours: String,
    minutes: String,
    seconds: String,
}

impl DurationForm {
    fn field_mut(&mut self, field: DurationField) -> &mut String {
        match field {
            DurationField::Hours => &mut self.hours,
            DurationField::Minutes => &mut self.minutes,
            DurationField::Seconds => &mut self.seconds,
        }
    }

    fn input(&self) -> DurationInput {
        DurationInput::parse(&self.hours, &self.minutes, &self.seconds)
    }

    fn write(&mut self, input: DurationInput) {
        for field in DurationField::ALL {
            *self.field_mut(field) = input.get(field).to_string();
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

struct TimeHubApp {
    hub: TimeHub,
    provider: Box<dyn TimeProvider>,
    now: DateTime<Utc>,
    form: DurationForm,
    status_message: Option<(String, Instant)>,
}

impl TimeHubApp {
    fn new(hub: TimeHub, provider: Box<dyn TimeProvider>) -> Self {
        let now = provider.now();
        Self {
            hub,
            provider,
            now,
            form: DurationForm::default(),
            status_message: None,
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some((text.into(), Instant::now() + STATUS_TTL));
    }

    fn report(&mut self, outcome: &PollOutcome) {
        if let Some(change) = outcome.phase_change {
            self.set_status(format!(
                "{} finished, {} started ({} work laps)",
                change.finished.as_str(),
                change.next.as_str(),
                change.work_laps_completed
            ));
        }
        if outcome.countdown_expired {
            self.set_status("Time's up!");
        }
    }

    fn show_header(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new("TimeHub")
                    .size(24.0)
                    .color(ACCENT)
                    .strong(),
            );
            ui.separator();
            for mode in Mode::ALL {
                let selected = self.hub.active_mode() == mode;
                if ui.selectable_label(selected, mode.title()).clicked() {
                    self.hub.activate(mode, self.now);
                }
            }
        });
        if let Some((msg, _)) = &self.status_message {
            ui.label(
                RichText::new(msg)
                    .color(Color32::from_rgb(111, 228, 134))
                    .strong(),
            );
        }
    }

    fn show_clock(&mut self, ui: &mut Ui) {
        let now = self.now;
        let clock = self.hub.clock();
        let current_zone = clock.zone();
        let use_24h = clock.use_24h();
        ui.label(
            RichText::new(&clock.reading().time_text)
                .size(48.0)
                .color(READOUT)
                .strong(),
        );
        ui.label(
            RichText::new(&clock.reading().date_text)
                .size(18.0)
                .color(Color32::from_rgb(169, 188, 209)),
        );
        ui.add_space(8.0);

        let mut picked = None;
        egui::ComboBox::from_label("Time zone")
            .selected_text(current_zone.label)
            .show_ui(ui, |ui| {
                for zone in &TIME_ZONES {
                    if ui
                        .selectable_label(zone.zone_id == current_zone.zone_id, zone.label)
                        .clicked()
                    {
                        picked = Some(zone.zone_id);
                    }
                }
            });
        if let Some(zone_id) = picked {
            let zone = self.hub.select_time_zone(zone_id, now);
            self.set_status(format!("Showing {}", zone.label));
        }

        if ui
            .button(if use_24h {
                "Switch to 12h"
            } else {
                "Switch to 24h"
            })
            .clicked()
        {
            self.hub.set_hour_format(!use_24h, now);
        }

        if let Some(reason) = self.hub.zone_fallback() {
            ui.label(
                RichText::new(format!("Fallback: {reason}"))
                    .color(Color32::from_rgb(255, 183, 95))
                    .strong(),
            );
        }
    }

    fn show_pomodoro(&mut self, ui: &mut Ui) {
        let now = self.now;
        let pomodoro = self.hub.pomodoro();
        let running = pomodoro.is_running();
        ui.label(
            RichText::new(pomodoro.display())
                .size(48.0)
                .color(READOUT)
                .strong(),
        );
        ui.label(
            RichText::new(format!(
                "{}  |  work laps {}",
                pomodoro.phase().status_label(),
                pomodoro.work_laps_completed()
            ))
            .color(Color32::from_rgb(114, 220, 205)),
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui.button(if running { "Pause" } else { "Start" }).clicked() {
                let pomodoro = self.hub.pomodoro_mut();
                if running {
                    pomodoro.pause();
                } else {
                    pomodoro.start(now);
                }
            }
            if ui.button("Reset").clicked() {
                self.hub.pomodoro_mut().reset();
            }
        });
        ui.add_enabled_ui(!running, |ui| {
            ui.horizontal(|ui| {
                if ui.button("- 1 min").clicked() {
                    self.hub.pomodoro_mut().adjust_remaining(-1);
                }
                if ui.button("+ 1 min").clicked() {
                    self.hub.pomodoro_mut().adjust_remaining(1);
                }
                ui.label(
                    RichText::new(format!(
                        "{MIN_ADJUST_MINUTES}-{MAX_ADJUST_MINUTES} min"
                    ))
                    .color(Color32::from_rgb(161, 180, 201)),
                );
            });
        });
    }

    fn show_countdown(&mut self, ui: &mut Ui) {
        let now = self.now;
        let countdown = self.hub.countdown();
        let state = countdown.state();
        ui.label(
            RichText::new(countdown.display())
                .size(48.0)
                .color(if state == CountdownState::Expired {
                    Color32::from_rgb(255, 122, 110)
                } else {
                    READOUT
                })
                .strong(),
        );
        if countdown.total_ms() > 0 {
            let done = 1.0 - countdown.remaining_ms() as f32 / countdown.total_ms() as f32;
            ui.add(egui::ProgressBar::new(done).desired_width(280.0));
        }
        if state == CountdownState::Expired {
            ui.label(
                RichText::new("Time's up!")
                    .color(Color32::from_rgb(255, 122, 110))
                    .strong(),
            );
        }
        ui.add_space(8.0);

        ui.add_enabled_ui(state != CountdownState::Running, |ui| {
            ui.horizontal(|ui| {
                for field in DurationField::ALL {
                    ui.vertical(|ui| {
                        if ui.small_button("▲").clicked() {
                            let mut input = self.form.input();
                            input.adjust(field, 1);
                            self.form.write(input);
                        }
                        let text = self.form.field_mut(field);
                        if ui
                            .add(
                                TextEdit::singleline(text)
                                    .desired_width(40.0)
                                    .hint_text("0"),
                            )
                            .changed()
                        {
                            text.retain(|ch| ch.is_ascii_digit() || ch == '-' || ch == '+');
                        }
                        if ui.small_button("▼").clicked() {
                            let mut input = self.form.input();
                            input.adjust(field, -1);
                            self.form.write(input);
                        }
                    });
                    ui.label(field.label());
                }
            });
            if ui.button("Set").clicked() {
                let input = self.form.input();
                if self.hub.countdown_mut().set_from_input(&input) {
                    self.form.clear();
                } else {
                    self.set_status("Enter a duration above zero");
                }
            }
        });

        ui.horizontal(|ui| {
            let countdown = self.hub.countdown_mut();
            if countdown.is_running() {
                if ui.button("Pause").clicked() {
                    countdown.pause();
                }
            } else if ui
                .add_enabled(state == CountdownState::Set, egui::Button::new("Start"))
                .clicked()
            {
                countdown.start(now);
            }
            if ui.button("Reset").clicked() {
                countdown.reset();
            }
        });
    }

    fn show_stopwatch(&mut self, ui: &mut Ui) {
        let now = self.now;
        let stopwatch = self.hub.stopwatch();
        let running = stopwatch.is_running();
        ui.label(
            RichText::new(stopwatch.display())
                .size(44.0)
                .color(READOUT)
                .strong(),
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let stopwatch = self.hub.stopwatch_mut();
            if ui.button(if running { "Pause" } else { "Start" }).clicked() {
                if running {
                    stopwatch.pause();
                } else {
                    stopwatch.start(now);
                }
            }
            if ui.add_enabled(running, egui::Button::new("Lap")).clicked() {
                stopwatch.lap(now);
            }
            if ui.button("Reset").clicked() {
                stopwatch.reset();
            }
        });
        ui.separator();

        let stopwatch = self.hub.stopwatch();
        if stopwatch.lap_count() == 0 {
            ui.label(RichText::new("No laps yet.").color(Color32::from_rgb(161, 180, 201)));
            return;
        }
        ScrollArea::vertical().id_salt("laps_scroll").show(ui, |ui| {
            egui::Grid::new("laps_grid")
                .striped(true)
                .num_columns(3)
                .show(ui, |ui| {
                    ui.strong("Lap");
                    ui.strong("Split");
                    ui.strong("Total");
                    ui.end_row();
                    for lap in stopwatch.laps() {
                        ui.label(format!("Lap {}", lap.sequence));
                        ui.monospace(format_duration(lap.since_last_ms, true));
                        ui.monospace(format_duration(lap.total_ms, true));
                        ui.end_row();
                    }
                });
        });
    }

    fn repaint_delay(&self) -> Option<Duration> {
        let tick_wait = self.hub.next_due().map(|due| {
            let ms = millis_between(due, self.provider.now()).max(0);
            Duration::from_millis(ms.unsigned_abs())
        });
        let status_wait = self
            .status_message
            .as_ref()
            .map(|(_, expires_at)| expires_at.saturating_duration_since(Instant::now()));
        [tick_wait, status_wait].into_iter().flatten().min()
    }
}

impl eframe::App for TimeHubApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        self.now = self.provider.now();
        let outcome = self.hub.poll(self.now);
        self.report(&outcome);

        TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.show_header(ui));

        TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(format!(
                        "Source: {} | Zone: {}",
                        self.provider.label(),
                        self.hub.clock().zone().zone_id
                    ))
                    .color(Color32::from_rgb(161, 180, 201)),
                );
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Center), |ui| {
                match self.hub.active_mode() {
                    Mode::Clock => self.show_clock(ui),
                    Mode::Pomodoro => self.show_pomodoro(ui),
                    Mode::Timer => self.show_countdown(ui),
                    Mode::Stopwatch => self.show_stopwatch(ui),
                }
            });
        });

        if let Some(wait) = self.repaint_delay() {
            ctx.request_repaint_after(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_steps_are_clamped_and_written_back() {
        let mut form = DurationForm {
            hours: "99".to_string(),
            minutes: "abc".to_string(),
            seconds: "-7".to_string(),
        };
        let mut input = form.input();
        input.adjust(DurationField::Hours, 1);
        input.adjust(DurationField::Minutes, -1);
        input.adjust(DurationField::Seconds, 1);
        form.write(input);
        assert_eq!(form.hours, "99");
        assert_eq!(form.minutes, "0");
        assert_eq!(form.seconds, "8");
    }

    #[test]
    fn cleared_form_parses_to_zero() {
        let mut form = DurationForm {
            hours: "1".to_string(),
            minutes: "2".to_string(),
            seconds: "3".to_string(),
        };
        form.clear();
        assert_eq!(form.input(), DurationInput::default());
    }
}
