//! Clap CLI definitions for the `cpshell` command.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// cpshell -- reproducible shells for competitive programming repositories.
///
/// Resolves the repository's `cpshell.toml` into a pinned package set,
/// records it in `cpshell.lock`, and opens shells with the `cp` and
/// `kattis` wrappers on `PATH`.
#[derive(Parser, Debug)]
#[command(
    name = "cpshell",
    about = "Reproducible shells for competitive programming repositories",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Repository root (default: the git root of the current directory).
    #[arg(long, global = true, env = "CPSHELL_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a shell (or run a command) inside the environment.
    #[command(alias = "shell")]
    Enter(EnterArgs),

    /// Resolve the manifest and write cpshell.lock.
    Lock(LockArgs),

    /// Verify the lockfile and probe the host interpreter and libraries.
    #[command(alias = "doctor")]
    Check,

    /// Show the resolved package set for a platform.
    Show(ShowArgs),

    /// Print the script a wrapper would launch from the current directory.
    Which(WhichArgs),

    /// List supported platforms.
    Platforms,

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Subcommand arguments
// ---------------------------------------------------------------------------

/// Arguments for `cpshell enter`.
#[derive(Args, Debug)]
pub struct EnterArgs {
    /// Platform to provision (default: $CPSHELL_PLATFORM or the host).
    #[arg(long, env = "CPSHELL_PLATFORM")]
    pub platform: Option<String>,

    /// Run CMD instead of an interactive shell.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub command: Option<OsString>,

    /// Arguments passed to CMD.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        requires = "command",
        value_name = "ARGS"
    )]
    pub args: Vec<OsString>,

    /// Directory containing the `cpshell-cp` and `cpshell-kattis` binaries
    /// (default: next to cpshell).
    #[arg(long, env = "CPSHELL_WRAPPER_DIR", value_name = "DIR")]
    pub wrapper_dir: Option<PathBuf>,

    /// Enter even if the interpreter or a library does not match its pin.
    #[arg(long)]
    pub allow_mismatch: bool,
}

/// Arguments for `cpshell lock`.
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Only (re)lock these platforms; other entries are kept.
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<String>,
}

/// Arguments for `cpshell show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Platform to show (default: the host).
    #[arg(long)]
    pub platform: Option<String>,
}

/// Arguments for `cpshell which`.
#[derive(Args, Debug)]
pub struct WhichArgs {
    /// Wrapper name (`cp` or `kattis`).
    pub command: String,
}

/// Arguments for `cpshell completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}
