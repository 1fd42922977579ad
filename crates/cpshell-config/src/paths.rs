//! Well-known files and directories under a repository root.
//!
//! Everything cpshell writes lives in `.cpshell/` next to the manifest, so
//! a single ignore entry keeps it out of version control.

use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// The manifest file name.
pub const MANIFEST_FILE: &str = "cpshell.toml";

/// The lockfile name.
pub const LOCK_FILE: &str = "cpshell.lock";

/// The name of the per-repository state directory.
pub const STATE_DIR_NAME: &str = ".cpshell";

/// Path of the manifest for the repository at `root`.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Path of the lockfile for the repository at `root`.
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

/// Path of the state directory for the repository at `root`.
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR_NAME)
}

/// Directory holding the profile for `platform`.
pub fn profile_dir(root: &Path, platform: &Platform) -> PathBuf {
    state_dir(root).join("profiles").join(platform.as_str())
}

/// The `bin` directory of the profile for `platform`.
pub fn profile_bin_dir(root: &Path, platform: &Platform) -> PathBuf {
    profile_dir(root, platform).join("bin")
}

/// Ensure the state directory exists, returning its path.
///
/// A `.gitignore` containing `*` is written on creation so the directory
/// never shows up as untracked.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory or ignore file cannot
/// be written.
pub fn ensure_state_dir(root: &Path) -> std::io::Result<PathBuf> {
    let dir = state_dir(root);
    std::fs::create_dir_all(&dir)?;

    let ignore = dir.join(".gitignore");
    if !ignore.exists() {
        std::fs::write(&ignore, "*\n")?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_layout() {
        let root = Path::new("/repo");
        let platform: Platform = "x86_64-linux".parse().unwrap();
        assert_eq!(
            profile_bin_dir(root, &platform),
            PathBuf::from("/repo/.cpshell/profiles/x86_64-linux/bin")
        );
        assert_eq!(manifest_path(root), PathBuf::from("/repo/cpshell.toml"));
        assert_eq!(lock_path(root), PathBuf::from("/repo/cpshell.lock"));
    }

    #[test]
    fn test_ensure_state_dir_creates_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = ensure_state_dir(dir.path()).unwrap();
        assert!(state.is_dir());
        assert!(state.ends_with(STATE_DIR_NAME));
        assert_eq!(std::fs::read_to_string(state.join(".gitignore")).unwrap(), "*\n");
    }

    #[test]
    fn test_ensure_state_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_state_dir(dir.path()).unwrap();
        std::fs::write(first.join(".gitignore"), "custom\n").unwrap();
        let second = ensure_state_dir(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(second.join(".gitignore")).unwrap(),
            "custom\n"
        );
    }
}
