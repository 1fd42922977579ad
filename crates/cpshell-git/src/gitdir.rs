//! Repository root resolution.
//!
//! [`resolve_repo_root`] asks git for the top-level directory of the working
//! tree containing `cwd` and checks that the answer is an existing ancestor
//! of `cwd`. It is evaluated fresh on every call; nothing is cached.

use crate::commands::{git_command_bytes, GitError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the git root for `cwd` using `git rev-parse --show-toplevel`.
///
/// # Errors
///
/// - [`GitError::NotARepo`] if `cwd` is not inside a working tree (the
///   diagnostic carries git's stderr verbatim), or if git reports a root that
///   does not exist or does not contain `cwd`.
/// - [`GitError::SpawnError`] if `git` cannot be run at all.
///
/// # Examples
///
/// ```no_run
/// use cpshell_git::resolve_repo_root;
///
/// let cwd = std::env::current_dir().unwrap();
/// let root = resolve_repo_root(&cwd).unwrap();
/// println!("git root: {}", root.display());
/// ```
pub fn resolve_repo_root(cwd: &Path) -> Result<PathBuf> {
    let stdout = match git_command_bytes(&["rev-parse", "--show-toplevel"], cwd) {
        Ok(stdout) => stdout,
        Err(GitError::CommandFailed { stderr, .. }) => {
            return Err(GitError::NotARepo { diagnostic: stderr });
        }
        Err(e) => return Err(e),
    };

    let root = PathBuf::from(normalize_git_path(path_from_bytes(strip_newline(
        stdout,
    ))));

    // An empty answer means we are inside the .git directory itself.
    if root.as_os_str().is_empty() {
        return Err(GitError::NotARepo {
            diagnostic: format!("fatal: {} is not inside a work tree\n", cwd.display())
                .into_bytes(),
        });
    }

    check_ancestor(&root, cwd)?;
    tracing::debug!(root = %root.display(), "resolved git root");
    Ok(root)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Ensures `root` exists and is `cwd` or one of its ancestors.
fn check_ancestor(root: &Path, cwd: &Path) -> Result<()> {
    let not_ancestor = || GitError::NotARepo {
        diagnostic: format!(
            "fatal: git root {} does not contain {}\n",
            root.display(),
            cwd.display()
        )
        .into_bytes(),
    };

    // Canonicalize both so symlinked temp dirs (/tmp vs /private/tmp) compare.
    let root = root.canonicalize().map_err(|_| not_ancestor())?;
    let cwd = cwd.canonicalize().map_err(|_| not_ancestor())?;

    if cwd.starts_with(&root) {
        Ok(())
    } else {
        Err(not_ancestor())
    }
}

/// Drops the single trailing newline git appends to its output.
fn strip_newline(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
    bytes
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> OsString {
    OsString::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Normalize git paths for Windows compatibility.
///
/// Git on Windows may return MSYS-style paths like `/c/Users/...` or forward-
/// slash paths like `C:/Users/...`. This function converts them to native
/// format. On other platforms it is the identity.
fn normalize_git_path(path: OsString) -> OsString {
    if std::path::MAIN_SEPARATOR != '\\' {
        return path;
    }

    let path = path.to_string_lossy();
    let path = path.trim();

    // Convert /c/Users/... to C:\Users\...
    if path.len() >= 3
        && path.as_bytes()[0] == b'/'
        && path.as_bytes()[2] == b'/'
        && path.as_bytes()[1].is_ascii_alphabetic()
    {
        let drive = path.as_bytes()[1].to_ascii_uppercase() as char;
        let rest = &path[2..];
        return OsString::from(format!("{drive}:{}", rest.replace('/', "\\")));
    }

    // Convert C:/Users/... to C:\Users\...
    OsString::from(path.replace('/', "\\"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
