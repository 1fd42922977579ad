//! Materialized profiles: a per-platform `bin` directory holding the
//! wrappers, prepended to `PATH` inside the environment.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use cpshell_config::Platform;
use cpshell_config::paths::{ensure_state_dir, profile_bin_dir, profile_dir};
use cpshell_lockfile::FileLock;

use crate::error::{EnvError, Result};
use crate::resolve::Resolution;

/// Name of the lock file guarding a profile directory.
const PROFILE_LOCK: &str = "profile.lock";

/// Variable naming the active platform inside the environment.
pub const PLATFORM_ENV: &str = "CPSHELL_PLATFORM";

/// Variable naming the repository root inside the environment.
pub const ROOT_ENV: &str = "CPSHELL_ROOT";

/// A materialized profile for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub platform: Platform,
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    /// Entries created in `bin_dir`, in installation order.
    pub links: Vec<PathBuf>,
}

/// The directory holding the running executable, where the wrapper binaries
/// are installed alongside it.
pub fn default_wrapper_dir() -> Result<PathBuf> {
    let exe = env::current_exe().map_err(|source| EnvError::io("current executable", source))?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Install the wrappers of `resolution` into the profile under `root`.
///
/// Every wrapper named by the resolution must exist as
/// `<wrapper_dir>/cpshell-<name><EXE_SUFFIX>`; the profile entry is named
/// `<name><EXE_SUFFIX>`. Entries in the profile's `bin` directory that the
/// resolution no longer names are removed.
///
/// # Errors
///
/// - [`EnvError::UnknownWrapper`] if a wrapper is not shipped with cpshell.
/// - [`EnvError::WrapperNotInstalled`] if a wrapper binary is missing.
/// - [`EnvError::Io`] if the profile cannot be written.
pub fn materialize(root: &Path, resolution: &Resolution, wrapper_dir: &Path) -> Result<Profile> {
    let platform = &resolution.platform;
    ensure_state_dir(root).map_err(|source| EnvError::io(root, source))?;

    let dir = profile_dir(root, platform);
    let _guard = FileLock::acquire(&dir.join(PROFILE_LOCK))?;

    let bin_dir = profile_bin_dir(root, platform);
    fs::create_dir_all(&bin_dir).map_err(|source| EnvError::io(&bin_dir, source))?;

    // Check every source before touching the profile.
    let mut wanted = Vec::new();
    let mut sources = Vec::new();
    for name in resolution.wrapper_names() {
        let wrapper =
            cpshell_shim::lookup(name).ok_or_else(|| EnvError::UnknownWrapper(name.to_string()))?;
        let source = wrapper_dir.join(format!("{}{}", wrapper.binary, env::consts::EXE_SUFFIX));
        if !source.is_file() {
            return Err(EnvError::WrapperNotInstalled {
                name: name.to_string(),
                path: source,
            });
        }
        wanted.push(format!("{name}{}", env::consts::EXE_SUFFIX));
        sources.push(source);
    }

    remove_stale(&bin_dir, &wanted)?;

    let mut links = Vec::with_capacity(sources.len());
    for (source, file) in sources.iter().zip(&wanted) {
        let link = bin_dir.join(file);
        replace_entry(&link)?;
        install(source, &link).map_err(|e| EnvError::io(&link, e))?;
        links.push(link);
    }

    tracing::info!(%platform, bin = %bin_dir.display(), count = links.len(), "profile materialized");
    Ok(Profile {
        platform: platform.clone(),
        root: root.to_path_buf(),
        bin_dir,
        links,
    })
}

impl Profile {
    /// `PATH` with the profile's `bin` directory in front.
    pub fn search_path(&self) -> Result<OsString> {
        let mut dirs = vec![self.bin_dir.clone()];
        if let Some(path) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&path));
        }
        env::join_paths(dirs).map_err(|e| {
            EnvError::io(
                &self.bin_dir,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })
    }

    /// A command for `program` that runs inside the environment.
    pub fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Result<Command> {
        let mut cmd = Command::new(program);
        cmd.env("PATH", self.search_path()?)
            .env(PLATFORM_ENV, self.platform.as_str())
            .env(ROOT_ENV, &self.root);
        Ok(cmd)
    }
}

fn remove_stale(bin_dir: &Path, wanted: &[String]) -> Result<()> {
    let entries = fs::read_dir(bin_dir).map_err(|source| EnvError::io(bin_dir, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| EnvError::io(bin_dir, source))?;
        let keep = entry
            .file_name()
            .to_str()
            .is_some_and(|name| wanted.iter().any(|w| w == name));
        if !keep {
            let path = entry.path();
            tracing::debug!(path = %path.display(), "removing stale profile entry");
            fs::remove_file(&path).map_err(|source| EnvError::io(&path, source))?;
        }
    }
    Ok(())
}

fn replace_entry(link: &Path) -> Result<()> {
    // symlink_metadata so dangling links are seen too.
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link).map_err(|source| EnvError::io(link, source))?;
    }
    Ok(())
}

#[cfg(unix)]
fn install(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(not(unix))]
fn install(source: &Path, link: &Path) -> std::io::Result<()> {
    fs::copy(source, link).map(|_| ())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use cpshell_config::Manifest;
    use pretty_assertions::assert_eq;

    fn linux() -> Platform {
        "x86_64-linux".parse().unwrap()
    }

    fn fake_wrappers(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(
                dir.join(format!("cpshell-{name}{}", env::consts::EXE_SUFFIX)),
                "",
            )
            .unwrap();
        }
    }

    #[test]
    fn installs_every_wrapper() {
        let root = tempfile::tempdir().unwrap();
        let wrappers = tempfile::tempdir().unwrap();
        fake_wrappers(wrappers.path(), &["cp", "kattis"]);

        let resolution = resolve(&Manifest::default(), &linux()).unwrap();
        let profile = materialize(root.path(), &resolution, wrappers.path()).unwrap();

        assert_eq!(profile.bin_dir, profile_bin_dir(root.path(), &linux()));
        assert_eq!(profile.links.len(), 2);
        for link in &profile.links {
            assert!(link.exists(), "{} missing", link.display());
        }
        assert!(root.path().join(".cpshell/.gitignore").is_file());
    }

    #[test]
    fn entries_take_the_command_name() {
        let root = tempfile::tempdir().unwrap();
        let wrappers = tempfile::tempdir().unwrap();
        fake_wrappers(wrappers.path(), &["cp", "kattis"]);

        let resolution = resolve(&Manifest::default(), &linux()).unwrap();
        let profile = materialize(root.path(), &resolution, wrappers.path()).unwrap();

        let suffix = env::consts::EXE_SUFFIX;
        assert_eq!(
            profile.links,
            vec![
                profile.bin_dir.join(format!("cp{suffix}")),
                profile.bin_dir.join(format!("kattis{suffix}")),
            ]
        );
        #[cfg(unix)]
        assert_eq!(
            fs::read_link(&profile.links[0]).unwrap(),
            wrappers.path().join("cpshell-cp")
        );
    }

    #[test]
    fn missing_wrapper_binary() {
        let root = tempfile::tempdir().unwrap();
        let wrappers = tempfile::tempdir().unwrap();
        fake_wrappers(wrappers.path(), &["cp"]);

        let resolution = resolve(&Manifest::default(), &linux()).unwrap();
        let err = materialize(root.path(), &resolution, wrappers.path()).unwrap_err();
        assert!(matches!(
            err,
            EnvError::WrapperNotInstalled { ref name, .. } if name == "kattis"
        ));
    }

    #[test]
    fn rematerializing_removes_dropped_wrappers() {
        let root = tempfile::tempdir().unwrap();
        let wrappers = tempfile::tempdir().unwrap();
        fake_wrappers(wrappers.path(), &["cp", "kattis"]);

        let full = resolve(&Manifest::default(), &linux()).unwrap();
        materialize(root.path(), &full, wrappers.path()).unwrap();

        let mut manifest = Manifest::default();
        manifest.wrappers = vec!["cp".to_string()];
        let only_cp = resolve(&manifest, &linux()).unwrap();
        let profile = materialize(root.path(), &only_cp, wrappers.path()).unwrap();

        let mut names: Vec<String> = fs::read_dir(&profile.bin_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![format!("cp{}", env::consts::EXE_SUFFIX)]);
    }

    #[test]
    fn command_prepends_profile_to_path() {
        let root = tempfile::tempdir().unwrap();
        let profile = Profile {
            platform: linux(),
            root: root.path().to_path_buf(),
            bin_dir: root.path().join("bin"),
            links: Vec::new(),
        };

        let path = profile.search_path().unwrap();
        let first = env::split_paths(&path).next().unwrap();
        assert_eq!(first, root.path().join("bin"));

        let cmd = profile.command("true").unwrap();
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.iter().any(|(k, v)| k.to_str() == Some(PLATFORM_ENV)
            && v.and_then(|v| v.to_str()) == Some("x86_64-linux")));
        assert!(envs.iter().any(|(k, _)| k.to_str() == Some(ROOT_ENV)));
    }
}
