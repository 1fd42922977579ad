//! Probing the host for the pinned interpreter and libraries.
//!
//! Probes only ask questions; they never install anything. The interpreter
//! banner they capture is what `cpshell enter` prints on entry.

use std::process::Command;

use cpshell_config::{Interpreter, Package};

use crate::error::{EnvError, Result};

/// Python snippet printing a module's `__version__` (empty if it has none).
const MODULE_VERSION_SNIPPET: &str = "import importlib, sys\n\
m = importlib.import_module(sys.argv[1])\n\
sys.stdout.write(str(getattr(m, '__version__', '')))";

/// What `<interpreter> --version` reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterProbe {
    /// The trimmed banner, e.g. `Python 3.12.8`.
    pub banner: String,
    /// The version token parsed from the banner.
    pub version: Option<String>,
    /// Whether the version satisfies the pin.
    pub matches: bool,
}

/// What importing a library reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryProbe {
    /// `None` if the module could not be imported.
    pub version: Option<String>,
    /// Whether the version satisfies the pin.
    pub matches: bool,
}

/// Returns `true` if `reported` equals `pinned` or extends it with further
/// `.`-separated components (`3.12` accepts `3.12.8` but not `3.120`).
pub fn version_matches(pinned: &str, reported: &str) -> bool {
    reported == pinned
        || reported
            .strip_prefix(pinned)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Extracts the first whitespace-separated token that starts with a digit.
pub fn parse_version(banner: &str) -> Option<String> {
    banner
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
}

/// Run `<program> --version` and compare it against the pin.
///
/// Some interpreters print their banner on stderr, so stderr is used when
/// stdout is empty.
///
/// # Errors
///
/// Returns [`EnvError::Probe`] if the interpreter cannot be started.
pub fn probe_interpreter(interpreter: &Interpreter) -> Result<InterpreterProbe> {
    let output = Command::new(&interpreter.program)
        .arg("--version")
        .output()
        .map_err(|source| EnvError::Probe {
            program: interpreter.program.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let banner = if stdout.trim().is_empty() {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    } else {
        stdout.trim().to_string()
    };

    let version = parse_version(&banner);
    let matches = output.status.success()
        && version
            .as_deref()
            .is_some_and(|v| version_matches(&interpreter.version, v));

    tracing::debug!(program = %interpreter.program, %banner, matches, "probed interpreter");
    Ok(InterpreterProbe {
        banner,
        version,
        matches,
    })
}

/// Ask the interpreter for `package`'s module version.
///
/// # Errors
///
/// Returns [`EnvError::Probe`] if the interpreter cannot be started. A
/// failed import is reported as `version: None`, not as an error.
pub fn probe_library(interpreter: &Interpreter, package: &Package) -> Result<LibraryProbe> {
    let output = Command::new(&interpreter.program)
        .args(["-c", MODULE_VERSION_SNIPPET, package.module()])
        .output()
        .map_err(|source| EnvError::Probe {
            program: interpreter.program.clone(),
            source,
        })?;

    if !output.status.success() {
        tracing::debug!(module = package.module(), "import failed");
        return Ok(LibraryProbe {
            version: None,
            matches: false,
        });
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let matches = version_matches(&package.version, &version);
    Ok(LibraryProbe {
        version: Some(version),
        matches,
    })
}
