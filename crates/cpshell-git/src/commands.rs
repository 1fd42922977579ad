//! Git command execution wrappers.
//!
//! Provides a thin wrapper around `git` subprocess invocation so that the
//! rest of the workspace does not need to deal with `std::process::Command`
//! directly.

use std::path::Path;
use std::process::Command;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when running git commands.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be found or spawned.
    #[error("failed to execute git")]
    SpawnError(#[from] std::io::Error),

    /// The git command exited with a non-zero status.
    #[error(
        "git command failed (exit code {code:?}): {}",
        String::from_utf8_lossy(stderr).trim()
    )]
    CommandFailed {
        /// The exit code, or `None` if the process was killed by a signal.
        code: Option<i32>,
        /// The bytes git wrote to stderr, undecoded.
        stderr: Vec<u8>,
    },

    /// Not inside a git working tree.
    #[error("not a git repository")]
    NotARepo {
        /// Diagnostic bytes produced by git, passed through unchanged.
        diagnostic: Vec<u8>,
    },
}

impl GitError {
    /// Returns the raw diagnostic bytes git printed, if any.
    ///
    /// Callers that relay git's own message to the user (the command
    /// wrappers) write these to stderr without decoding them.
    pub fn diagnostic(&self) -> Option<&[u8]> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr.as_slice()),
            GitError::NotARepo { diagnostic } => Some(diagnostic.as_slice()),
            GitError::SpawnError(_) => None,
        }
    }
}

/// A specialized `Result` type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Execute a `git` command and return its raw stdout bytes.
///
/// # Errors
///
/// Returns [`GitError::SpawnError`] if `git` cannot be found or `cwd` is not
/// a usable directory, or [`GitError::CommandFailed`] if the command exits
/// with a non-zero status.
pub fn git_command_bytes(args: &[&str], cwd: &Path) -> Result<Vec<u8>> {
    tracing::debug!(?args, cwd = %cwd.display(), "running git");

    let output = Command::new("git").args(args).current_dir(cwd).output()?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            code: output.status.code(),
            stderr: output.stderr,
        });
    }

    Ok(output.stdout)
}

/// Execute a `git` command with the given arguments and working directory.
///
/// Returns the trimmed contents of stdout on success.
///
/// # Examples
///
/// ```no_run
/// use cpshell_git::commands::git_command;
/// use std::path::Path;
///
/// let version = git_command(&["--version"], Path::new(".")).unwrap();
/// println!("{version}");
/// ```
pub fn git_command(args: &[&str], cwd: &Path) -> Result<String> {
    let stdout = git_command_bytes(args, cwd)?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
