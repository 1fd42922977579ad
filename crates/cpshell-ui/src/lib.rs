//! Terminal styling for cpshell output.
//!
//! Colors follow the usual `NO_COLOR` / `CLICOLOR` conventions and are only
//! emitted when stdout is a terminal.

pub mod styles;
pub mod terminal;

pub use styles::{CheckStatus, render_accent, render_bold, render_check, render_muted};
pub use terminal::supports_color;
