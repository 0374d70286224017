use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::warn;

/// Audible cue for a finished countdown or Pomodoro phase.
pub trait CompletionSignal {
    fn fire(&self) -> Result<()>;
}

/// Rings the terminal bell on stdout.
pub struct TerminalBell;

impl CompletionSignal for TerminalBell {
    fn fire(&self) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(b"\x07")
            .and_then(|()| stdout.flush())
            .context("failed to ring terminal bell")
    }
}

pub struct Silent;

impl CompletionSignal for Silent {
    fn fire(&self) -> Result<()> {
        Ok(())
    }
}

/// Fires the signal and swallows any playback failure.
pub fn fire_and_forget(signal: &dyn CompletionSignal, reason: &str) {
    if let Err(err) = signal.fire() {
        warn!(reason, "completion chime failed: {err:#}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::rc::Rc;

    use anyhow::{Result, bail};

    use super::CompletionSignal;

    /// Counts firings; optionally fails every one of them.
    #[derive(Clone, Default)]
    pub struct CountingChime {
        pub fired: Rc<Cell<usize>>,
        pub failing: bool,
    }

    impl CompletionSignal for CountingChime {
        fn fire(&self) -> Result<()> {
            self.fired.set(self.fired.get() + 1);
            if self.failing {
                bail!("no audio device");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CountingChime;
    use super::*;

    #[test]
    fn failures_are_swallowed() {
        let chime = CountingChime {
            failing: true,
            ..CountingChime::default()
        };
        fire_and_forget(&chime, "test");
        fire_and_forget(&chime, "test");
        assert_eq!(chime.fired.get(), 2);
    }

    #[test]
    fn silent_signal_succeeds() {
        assert!(Silent.fire().is_ok());
    }
}
