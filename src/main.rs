mod chime;
mod clock;
mod countdown;
mod diagnostics;
mod format;
mod hub;
mod mode;
mod pomodoro;
mod prefs;
mod stopwatch;
mod ticker;
mod time_provider;
mod ui;
mod zones;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::chime::{CompletionSignal, Silent, TerminalBell};
use crate::diagnostics::MAX_BENCH_MS;
use crate::hub::TimeHub;
use crate::prefs::JsonFilePreferences;
use crate::time_provider::{SystemTimeProvider, TimeProvider};

#[derive(Parser, Debug)]
#[command(
    name = "timehub",
    version,
    about = "Clock, Pomodoro, countdown timer and stopwatch in one window"
)]
struct Cli {
    #[arg(long, default_value = "timehub-prefs.json")]
    prefs: PathBuf,

    #[arg(long, default_value = "clock", value_parser = ["clock", "pomodoro", "timer", "stopwatch"])]
    mode: String,

    /// Zone id such as "Asia/Tokyo", or "local".
    #[arg(long)]
    time_zone: Option<String>,

    #[arg(long = "hour-12")]
    hour_12: bool,

    /// Disable the completion chime.
    #[arg(long)]
    silent: bool,

    #[arg(long)]
    diagnostics: bool,

    #[arg(long, default_value_t = 2_000)]
    bench_ms: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.bench_ms == 0 {
        bail!("--bench-ms must be greater than zero");
    }
    if cli.bench_ms > MAX_BENCH_MS {
        bail!("--bench-ms must be at most {MAX_BENCH_MS} (one hour)");
    }

    let provider = SystemTimeProvider;
    let prefs = JsonFilePreferences::open(&cli.prefs);
    let chime: Box<dyn CompletionSignal> = if cli.silent {
        Box::new(Silent)
    } else {
        Box::new(TerminalBell)
    };

    let now = provider.now();
    let mut hub = TimeHub::new(Box::new(prefs), chime, now);
    if let Some(zone_id) = cli.time_zone.as_deref() {
        hub.select_time_zone(zone_id, now);
    }
    if cli.hour_12 {
        hub.set_hour_format(false, now);
    }
    hub.activate_id(&cli.mode, now);
    info!(
        mode = hub.active_mode().id(),
        zone = hub.clock().zone().zone_id,
        "time hub ready"
    );

    if cli.diagnostics {
        diagnostics::run_diagnostics(&hub, &provider, &cli.prefs, cli.bench_ms)?;
        return Ok(());
    }

    ui::app::run_gui(hub, Box::new(provider))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
