//! Provisioner error types.

use std::path::PathBuf;

use cpshell_config::ConfigError;
use cpshell_lockfile::LockError;

/// Errors that can occur while resolving or materializing an environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// The manifest could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested platform is not in the manifest's systems.
    #[error("platform {platform} is not supported (supported: {})", supported.join(", "))]
    UnsupportedPlatform {
        /// The requested platform.
        platform: String,
        /// The manifest's systems.
        supported: Vec<String>,
    },

    /// The manifest names a wrapper cpshell does not ship.
    #[error("unknown wrapper '{0}'")]
    UnknownWrapper(String),

    /// A wrapper binary is missing from the install directory.
    #[error("wrapper '{name}' is not installed (expected {})", path.display())]
    WrapperNotInstalled {
        /// The wrapper name.
        name: String,
        /// Where the binary was expected.
        path: PathBuf,
    },

    /// The lockfile disagrees with a fresh resolution.
    #[error("lockfile is out of date:\n  {}", diffs.join("\n  "))]
    LockMismatch {
        /// One line per difference.
        diffs: Vec<String>,
    },

    /// The lockfile uses a format this version does not understand.
    #[error("unsupported lockfile version {found} (expected {expected})")]
    LockVersion {
        /// The version found on disk.
        found: u32,
        /// The version this build writes.
        expected: u32,
    },

    /// A probe process could not be started.
    #[error("failed to run {program}")]
    Probe {
        /// The program that was run.
        program: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("failed to access {}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Taking a state lock failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The lockfile is not valid JSON for the expected schema.
    #[error("invalid lockfile")]
    Json(#[from] serde_json::Error),
}

impl EnvError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EnvError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for provisioning.
pub type Result<T> = std::result::Result<T, EnvError>;
