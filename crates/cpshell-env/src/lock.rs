//! The `cpshell.lock` lockfile.
//!
//! A lockfile records, per platform, the package set a manifest resolved
//! to. Because resolution is a pure function of the manifest, a lockfile
//! that still matches a fresh resolution proves the environment would be
//! rebuilt identically. The file is pretty-printed JSON with sorted keys, so
//! locking an unchanged manifest twice produces byte-identical output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cpshell_config::paths::{ensure_state_dir, lock_path};
use cpshell_config::{Manifest, Platform, Upstream};
use cpshell_lockfile::FileLock;
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};
use crate::resolve::{Resolution, ResolvedPackage, resolve};

/// The lockfile format version this build reads and writes.
pub const LOCK_FORMAT_VERSION: u32 = 1;

/// Name of the advisory lock guarding lockfile writes.
const WRITE_LOCK: &str = "lockfile.lock";

/// Contents of `cpshell.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    pub upstream: Upstream,
    pub platforms: BTreeMap<Platform, Vec<ResolvedPackage>>,
}

impl Lockfile {
    /// Resolve `manifest` for `only`, or for every supported platform when
    /// `only` is empty.
    pub fn from_manifest(manifest: &Manifest, only: &[Platform]) -> Result<Self> {
        let targets = if only.is_empty() {
            manifest.systems.as_slice()
        } else {
            only
        };

        let mut platforms = BTreeMap::new();
        for platform in targets {
            let resolution = resolve(manifest, platform)?;
            platforms.insert(resolution.platform, resolution.packages);
        }

        Ok(Self {
            version: LOCK_FORMAT_VERSION,
            upstream: manifest.upstream.clone(),
            platforms,
        })
    }

    /// Re-lock `only` (or everything) on top of an existing lockfile.
    ///
    /// Entries for other platforms survive when the pin is unchanged and the
    /// platform is still supported; a new pin starts from scratch.
    pub fn refresh(
        existing: Option<Lockfile>,
        manifest: &Manifest,
        only: &[Platform],
    ) -> Result<Self> {
        let mut fresh = Self::from_manifest(manifest, only)?;
        if let Some(old) = existing {
            if old.upstream == fresh.upstream {
                for (platform, packages) in old.platforms {
                    if manifest.supports(&platform) {
                        fresh.platforms.entry(platform).or_insert(packages);
                    }
                }
            }
        }
        Ok(fresh)
    }

    /// The locked resolution for `platform`, if present.
    pub fn resolution(&self, platform: &Platform) -> Option<Resolution> {
        self.platforms.get(platform).map(|packages| Resolution {
            platform: platform.clone(),
            upstream: self.upstream.clone(),
            packages: packages.clone(),
        })
    }

    /// Serialize to the on-disk representation.
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse the on-disk representation.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::LockVersion`] for a format this build does not
    /// know, or [`EnvError::Json`] for malformed content.
    pub fn from_json(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Header {
            version: u32,
        }
        let header: Header = serde_json::from_str(text)?;
        if header.version != LOCK_FORMAT_VERSION {
            return Err(EnvError::LockVersion {
                found: header.version,
                expected: LOCK_FORMAT_VERSION,
            });
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Write `lock` to `cpshell.lock` under `root`, returning the file path.
///
/// The write goes through a temporary file and a rename while holding the
/// state lock, so readers never observe a partial file.
pub fn write_lockfile(root: &Path, lock: &Lockfile) -> Result<PathBuf> {
    let state = ensure_state_dir(root).map_err(|e| EnvError::io(root, e))?;
    let _guard = FileLock::acquire(&state.join(WRITE_LOCK))?;

    let path = lock_path(root);
    let tmp = path.with_extension("lock.tmp");
    std::fs::write(&tmp, lock.to_json()?).map_err(|e| EnvError::io(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| EnvError::io(&path, e))?;

    tracing::info!(path = %path.display(), platforms = lock.platforms.len(), "wrote lockfile");
    Ok(path)
}

/// Read `cpshell.lock` under `root`, or `None` if there is none.
pub fn read_lockfile(root: &Path) -> Result<Option<Lockfile>> {
    let path = lock_path(root);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(EnvError::io(&path, e)),
    };
    Lockfile::from_json(&text).map(Some)
}

/// Compare every locked platform against a fresh resolution.
///
/// Returns one human-readable line per difference; empty means the lock is
/// current. Platforms the manifest supports but the lock omits are not
/// differences (see [`unlocked_platforms`]).
pub fn diff_lock(manifest: &Manifest, lock: &Lockfile) -> Vec<String> {
    let mut diffs = Vec::new();

    if lock.upstream != manifest.upstream {
        diffs.push(format!(
            "upstream: locked {}@{}, manifest pins {}@{}",
            lock.upstream.name,
            lock.upstream.revision,
            manifest.upstream.name,
            manifest.upstream.revision
        ));
    }

    for (platform, locked) in &lock.platforms {
        let fresh = match resolve(manifest, platform) {
            Ok(resolution) => resolution.packages,
            Err(e) => {
                diffs.push(format!("{platform}: {e}"));
                continue;
            }
        };
        diff_packages(platform, locked, &fresh, &mut diffs);
    }

    diffs
}

/// Check that `lock` matches a fresh resolution of `manifest`.
///
/// # Errors
///
/// Returns [`EnvError::LockMismatch`] listing every difference.
pub fn verify_lock(manifest: &Manifest, lock: &Lockfile) -> Result<()> {
    let diffs = diff_lock(manifest, lock);
    if diffs.is_empty() {
        Ok(())
    } else {
        Err(EnvError::LockMismatch { diffs })
    }
}

/// Platforms the manifest supports that `lock` has no entry for.
pub fn unlocked_platforms<'a>(manifest: &'a Manifest, lock: &Lockfile) -> Vec<&'a Platform> {
    manifest
        .systems
        .iter()
        .filter(|p| !lock.platforms.contains_key(*p))
        .collect()
}

fn diff_packages(
    platform: &Platform,
    locked: &[ResolvedPackage],
    fresh: &[ResolvedPackage],
    diffs: &mut Vec<String>,
) {
    let key = |p: &ResolvedPackage| (p.kind, p.name.clone());
    let locked_by_key: BTreeMap<_, _> = locked.iter().map(|p| (key(p), p)).collect();
    let fresh_by_key: BTreeMap<_, _> = fresh.iter().map(|p| (key(p), p)).collect();

    for ((kind, name), old) in &locked_by_key {
        match fresh_by_key.get(&(*kind, name.clone())) {
            None => diffs.push(format!("{platform}: {kind} {name} is locked but no longer resolved")),
            Some(new) if new.version != old.version => diffs.push(format!(
                "{platform}: {kind} {name} locked at {}, resolves to {}",
                old.version, new.version
            )),
            Some(new) if new.store_id != old.store_id => diffs.push(format!(
                "{platform}: {kind} {name} store id changed ({} -> {})",
                old.store_id, new.store_id
            )),
            Some(_) => {}
        }
    }
    for (kind, name) in fresh_by_key.keys() {
        if !locked_by_key.contains_key(&(*kind, name.clone())) {
            diffs.push(format!("{platform}: {kind} {name} resolves but is not locked"));
        }
    }
}
