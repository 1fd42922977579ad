//! Platform identifiers of the form `<arch>-<os>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::manifest::ConfigError;

/// The platforms supported when a manifest does not list its own.
pub const DEFAULT_SYSTEMS: &[&str] = &[
    "x86_64-linux",
    "aarch64-linux",
    "x86_64-darwin",
    "aarch64-darwin",
];

/// A target platform such as `x86_64-linux` or `aarch64-darwin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform(String);

impl Platform {
    /// The platform this binary was compiled for.
    ///
    /// macOS is reported as `darwin` to match the usual package-set naming.
    pub fn host() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Platform(format!("{}-{}", std::env::consts::ARCH, os))
    }

    /// The CPU architecture component.
    pub fn arch(&self) -> &str {
        self.0.split_once('-').map_or("", |(arch, _)| arch)
    }

    /// The operating system component.
    pub fn os(&self) -> &str {
        self.0.split_once('-').map_or("", |(_, os)| os)
    }

    /// The full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidPlatform {
            platform: s.to_string(),
            reason: reason.to_string(),
        };

        let (arch, os) = s
            .split_once('-')
            .ok_or_else(|| invalid("expected <arch>-<os>"))?;
        if arch.is_empty() || os.is_empty() {
            return Err(invalid("expected <arch>-<os>"));
        }
        if os.contains('-') {
            return Err(invalid("os must not contain '-'"));
        }
        let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
        if !arch.chars().all(valid_char) || !os.chars().all(valid_char) {
            return Err(invalid("only lowercase letters, digits and '_' are allowed"));
        }

        Ok(Platform(s.to_string()))
    }
}

impl TryFrom<String> for Platform {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> Self {
        p.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
