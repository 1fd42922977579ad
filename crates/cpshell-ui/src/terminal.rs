//! Terminal detection.

use std::env;

/// Returns `true` if stdout is connected to a terminal.
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// The environment inputs to the color decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorEnv {
    pub no_color: bool,
    pub clicolor: Option<String>,
    pub clicolor_force: bool,
    pub term: Option<String>,
}

impl ColorEnv {
    /// Read the inputs from the process environment.
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("NO_COLOR").is_some(),
            clicolor: env::var("CLICOLOR").ok(),
            clicolor_force: env::var_os("CLICOLOR_FORCE").is_some(),
            term: env::var("TERM").ok(),
        }
    }

    /// Decide whether to emit color, given whether the output is a terminal.
    ///
    /// `NO_COLOR`, `CLICOLOR=0` and `TERM=dumb` win over `CLICOLOR_FORCE`.
    pub fn allows_color(&self, tty: bool) -> bool {
        if self.no_color
            || self.clicolor.as_deref() == Some("0")
            || self.term.as_deref() == Some("dumb")
        {
            return false;
        }
        self.clicolor_force || tty
    }
}

/// Determines if ANSI color codes should be written to stdout.
pub fn supports_color() -> bool {
    ColorEnv::from_env().allows_color(is_tty())
}
