//! Color mode detection for CLI output.
//!
//! Respects the `NO_COLOR` environment variable and TTY detection.
//! See https://no-color.org/ for the NO_COLOR standard.

use std::io::IsTerminal;
use std::str::FromStr;

/// Color output mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Always use colors, even when output is not a TTY.
    Always,
    /// Never use colors.
    Never,
    /// Colors when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
}

impl FromStr for ColorMode {
    type Err = String;

    /// Accepts `always`, `never` and `auto`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "invalid color mode '{}' (expected always, never or auto)",
                other
            )),
        }
    }
}

impl ColorMode {
    /// Check if colors should be used based on current mode.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::env::var_os("NO_COLOR").is_none() && stdout_is_terminal(),
        }
    }
}

/// Whether stdout is attached to a terminal.
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}
