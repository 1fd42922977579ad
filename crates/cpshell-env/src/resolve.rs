//! Deterministic resolution of a manifest for one platform.

use std::fmt;

use cpshell_config::{Manifest, Platform, Upstream};
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};
use crate::store_id::store_id;

/// Version recorded for wrapper packages: the wrappers ship with cpshell.
pub const WRAPPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a resolved package provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// The interpreter runtime.
    Interpreter,
    /// A third-party library.
    Library,
    /// A command wrapper placed on `PATH`.
    Wrapper,
}

impl PackageKind {
    /// The lowercase name used in the lockfile and in store ids.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageKind::Interpreter => "interpreter",
            PackageKind::Library => "library",
            PackageKind::Wrapper => "wrapper",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub kind: PackageKind,
    pub store_id: String,
}

/// The installed package set for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub platform: Platform,
    pub upstream: Upstream,
    /// Interpreter first, then libraries by name, then wrappers in install order.
    pub packages: Vec<ResolvedPackage>,
}

impl Resolution {
    /// The packages of one kind, in resolution order.
    pub fn of_kind(&self, kind: PackageKind) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.iter().filter(move |p| p.kind == kind)
    }

    /// Names of the wrappers to install.
    pub fn wrapper_names(&self) -> Vec<&str> {
        self.of_kind(PackageKind::Wrapper)
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Resolve `manifest` for `platform`.
///
/// # Errors
///
/// - [`EnvError::UnsupportedPlatform`] if `platform` is not in the manifest.
/// - [`EnvError::UnknownWrapper`] if a wrapper name is not shipped.
pub fn resolve(manifest: &Manifest, platform: &Platform) -> Result<Resolution> {
    if !manifest.supports(platform) {
        return Err(EnvError::UnsupportedPlatform {
            platform: platform.to_string(),
            supported: manifest.systems.iter().map(Platform::to_string).collect(),
        });
    }

    let upstream = &manifest.upstream;
    let package = |kind: PackageKind, name: &str, version: &str| ResolvedPackage {
        name: name.to_string(),
        version: version.to_string(),
        kind,
        store_id: store_id(upstream, platform, kind, name, version),
    };

    let mut packages = Vec::with_capacity(1 + manifest.packages.len() + manifest.wrappers.len());
    packages.push(package(
        PackageKind::Interpreter,
        &manifest.interpreter.program,
        &manifest.interpreter.version,
    ));

    let mut libraries: Vec<_> = manifest.packages.iter().collect();
    libraries.sort_by(|a, b| a.name.cmp(&b.name));
    packages.extend(
        libraries
            .into_iter()
            .map(|p| package(PackageKind::Library, &p.name, &p.version)),
    );

    for name in &manifest.wrappers {
        let wrapper =
            cpshell_shim::lookup(name).ok_or_else(|| EnvError::UnknownWrapper(name.clone()))?;
        packages.push(package(PackageKind::Wrapper, wrapper.name, WRAPPER_VERSION));
    }

    tracing::debug!(%platform, count = packages.len(), "resolved package set");
    Ok(Resolution {
        platform: platform.clone(),
        upstream: upstream.clone(),
        packages,
    })
}
