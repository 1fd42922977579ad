//! Wrapper error types and their reserved exit codes.

use std::error::Error;
use std::path::PathBuf;

use cpshell_git::GitError;

/// Exit code for a script that is missing or cannot be executed.
///
/// Matches the shell's "command not found" status.
pub const EXIT_SCRIPT_NOT_FOUND: u8 = 127;

/// Exit code used when the working directory is not inside a git work tree.
///
/// Matches the status git itself uses for fatal errors.
pub const EXIT_NOT_A_REPOSITORY: u8 = 128;

/// Errors a wrapper can hit before the target script takes over.
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// No enclosing git work tree, or git could not be run.
    #[error("not a git repository")]
    NotARepository {
        /// Bytes git wrote to stderr, relayed unchanged.
        diagnostic: Vec<u8>,
    },

    /// The resolved script is missing, not a file, or not executable.
    #[error("cannot launch {}", path.display())]
    ScriptNotFound {
        /// The resolved script path.
        path: PathBuf,
        /// The underlying failure.
        source: std::io::Error,
    },
}

impl ShimError {
    /// The process exit code reserved for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShimError::NotARepository { .. } => EXIT_NOT_A_REPOSITORY,
            ShimError::ScriptNotFound { .. } => EXIT_SCRIPT_NOT_FOUND,
        }
    }
}

impl From<GitError> for ShimError {
    fn from(err: GitError) -> Self {
        let diagnostic = match err.diagnostic() {
            Some(bytes) => bytes.to_vec(),
            None => format!("{}\n", render_chain(&err)).into_bytes(),
        };
        ShimError::NotARepository { diagnostic }
    }
}

/// `err` followed by each of its sources, separated by `: `.
pub fn render_chain(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// A specialized `Result` type for wrapper operations.
pub type Result<T> = std::result::Result<T, ShimError>;
