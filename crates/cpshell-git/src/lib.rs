//! Git integration for cpshell.
//!
//! This crate runs `git` as a subprocess and resolves the top-level
//! directory of the working tree that contains a given directory. Both the
//! command wrappers and the provisioner go through [`resolve_repo_root`].

pub mod commands;
pub mod gitdir;

pub use commands::{GitError, Result};
pub use gitdir::resolve_repo_root;
