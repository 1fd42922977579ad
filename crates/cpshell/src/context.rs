//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the global flags and knows how to find the
//! repository root, load its manifest and pick a platform.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cpshell_config::{Manifest, Platform, load_manifest};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit repository root from `--root` / `CPSHELL_ROOT`.
    pub root_override: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            root_override: global.root.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// The repository root: the override if given, otherwise the git root
    /// of the current directory.
    pub fn root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root_override {
            return Ok(root.clone());
        }
        let cwd = env::current_dir().context("cannot determine working directory")?;
        let root = cpshell_git::resolve_repo_root(&cwd)
            .context("cpshell must be run inside a git repository (or pass --root)")?;
        tracing::debug!(root = %root.display(), "resolved repository root");
        Ok(root)
    }

    /// Load the manifest for the repository, returning the root with it.
    pub fn manifest(&self) -> Result<(PathBuf, Manifest)> {
        let root = self.root()?;
        let manifest = load_manifest(&root)?;
        Ok((root, manifest))
    }
}

/// Parse `requested`, or fall back to the host platform.
pub fn select_platform(requested: Option<&str>) -> Result<Platform> {
    match requested {
        Some(p) => p.parse().with_context(|| format!("bad --platform value '{p}'")),
        None => Ok(Platform::host()),
    }
}
