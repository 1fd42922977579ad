//! Exec-and-relay primitives.
//!
//! The target script inherits the environment and all three standard
//! streams, and runs in the caller's working directory. Nothing is captured or rewritten.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::error::{Result, ShimError};

/// How the target script is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Replace the current process image with the script (Unix only).
    ///
    /// Signals addressed to the wrapper land on the script, and the exit
    /// status is the script's by construction.
    Exec,
    /// Spawn the script as a child, wait for it and relay its status.
    Spawn,
}

impl LaunchMode {
    /// The preferred mode for the current platform.
    pub fn native() -> Self {
        if cfg!(unix) {
            LaunchMode::Exec
        } else {
            LaunchMode::Spawn
        }
    }
}

/// Check that `path` names an executable regular file.
pub fn check_launchable(path: &Path) -> Result<()> {
    let not_found = |source: io::Error| ShimError::ScriptNotFound {
        path: path.to_path_buf(),
        source,
    };

    let meta = fs::metadata(path).map_err(not_found)?;
    if !meta.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(not_found(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "not executable",
            )));
        }
    }

    Ok(())
}

/// Start the script at `path` with `args` in `cwd` and return the exit code
/// to relay.
///
/// With [`LaunchMode::Exec`] this only returns on failure.
pub fn launch<I, S>(path: &Path, cwd: &Path, args: I, mode: LaunchMode) -> Result<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(path);
    command.args(args).current_dir(cwd);

    let launch_failed = |source: io::Error| ShimError::ScriptNotFound {
        path: path.to_path_buf(),
        source,
    };

    #[cfg(unix)]
    if mode == LaunchMode::Exec {
        use std::os::unix::process::CommandExt;
        tracing::debug!(path = %path.display(), "exec");
        let err = command.exec();
        return Err(launch_failed(err));
    }

    tracing::debug!(path = %path.display(), ?mode, "spawn");
    let status = command.status().map_err(launch_failed)?;
    Ok(exit_code_from_status(status))
}

/// Map a child's exit status to this process's exit code.
///
/// A child killed by signal `n` maps to `128 + n`, as shells report it.
pub fn exit_code_from_status(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128u8.wrapping_add(signal as u8);
        }
    }

    1
}
