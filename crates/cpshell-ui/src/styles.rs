//! Colors and status markers for cpshell output.
//!
//! Only results get color: a check line is green, yellow or red depending
//! on its outcome, labels are muted, and headers use the accent color.

use std::fmt;

use owo_colors::OwoColorize;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff

fn paint(s: &str, rgb: (u8, u8, u8), color: bool) -> String {
    if color {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

/// Renders text in the muted color.
pub fn render_muted(s: &str) -> String {
    paint(s, MUTED, supports_color())
}

/// Renders text in the accent color.
pub fn render_accent(s: &str) -> String {
    paint(s, ACCENT, supports_color())
}

/// Renders text in bold.
pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Check results
// ---------------------------------------------------------------------------

/// Outcome of one `cpshell check` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    /// The bracketed marker, e.g. `[OK]`.
    pub fn marker(self) -> &'static str {
        match self {
            CheckStatus::Pass => "[OK]",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        }
    }

    /// The lowercase name used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            CheckStatus::Pass => PASS,
            CheckStatus::Warn => WARN,
            CheckStatus::Fail => FAIL,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats `[MARK] name: detail`, colored when `color` is set.
pub fn format_check(status: CheckStatus, name: &str, detail: &str, color: bool) -> String {
    let marker = paint(status.marker(), status.rgb(), color);
    if detail.is_empty() {
        format!("{marker} {name}")
    } else {
        format!("{marker} {name}: {}", paint(detail, MUTED, color))
    }
}

/// Renders a check line for stdout.
pub fn render_check(status: CheckStatus, name: &str, detail: &str) -> String {
    format_check(status, name, detail, supports_color())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_check_lines() {
        assert_eq!(
            format_check(CheckStatus::Pass, "git", "git version 2.47.1", false),
            "[OK] git: git version 2.47.1"
        );
        assert_eq!(
            format_check(CheckStatus::Fail, "lockfile", "", false),
            "[FAIL] lockfile"
        );
    }

    #[test]
    fn colored_check_keeps_text() {
        let line = format_check(CheckStatus::Warn, "platforms", "1 unlocked", true);
        assert!(line.contains("\u{1b}["));
        assert!(line.contains("[WARN]"));
        assert!(line.contains("platforms"));
    }

    #[test]
    fn statuses_order_by_severity() {
        let worst = [CheckStatus::Warn, CheckStatus::Pass, CheckStatus::Fail]
            .into_iter()
            .max();
        assert_eq!(worst, Some(CheckStatus::Fail));
        assert_eq!(CheckStatus::Warn.to_string(), "warn");
    }
}
