//! Configuration for the cpshell environment provisioner.
//!
//! This crate loads the `cpshell.toml` manifest from the repository root
//! (layered with built-in defaults and `CPSHELL_*` environment overrides),
//! defines platform identifiers, and knows where per-repository state lives.

pub mod manifest;
pub mod paths;
pub mod platform;

pub use manifest::{ConfigError, Interpreter, Manifest, Package, Result, Upstream, load_manifest};
pub use platform::Platform;
