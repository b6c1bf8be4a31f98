//! Progress indicators for long-running CLI operations.
//!
//! Spinners are only drawn on an interactive terminal; `--json` output and
//! pipes get no progress at all.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::color::stdout_is_terminal;

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: show an animated spinner
    Interactive,
    /// Non-TTY or machine-readable output: nothing
    Silent,
}

impl ProgressMode {
    pub fn detect(json: bool) -> Self {
        if json || !stdout_is_terminal() {
            Self::Silent
        } else {
            Self::Interactive
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// A spinner that wraps indicatif.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Start a spinner for an indeterminate operation.
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .tick_chars(SPINNER_CHARS)
                .template("{spinner:.cyan} {msg} ({elapsed})")
            {
                pb.set_style(style);
            }
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }

    /// Remove the spinner line.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
