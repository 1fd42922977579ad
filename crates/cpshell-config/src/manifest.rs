//! The environment manifest.
//!
//! The main entry point is [`Manifest`], the contents of `cpshell.toml` at
//! the repository root. It is loaded with [`load_manifest`], which layers
//! three sources with figment, later ones winning:
//!
//! 1. built-in defaults (python3 with `requests`, both wrappers),
//! 2. `cpshell.toml`, if present,
//! 3. `CPSHELL_*` environment variables, `__` separating nested keys
//!    (`CPSHELL_INTERPRETER__PROGRAM=python3.13`).

use std::collections::HashSet;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::MANIFEST_FILE;
use crate::platform::{DEFAULT_SYSTEMS, Platform};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CPSHELL_";

/// `CPSHELL_*` variables that carry runtime state rather than manifest keys.
const RESERVED_ENV_KEYS: &[&str] = &["log", "platform", "root", "wrapper_dir"];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or did not match the manifest schema.
    #[error("failed to load manifest")]
    Load(#[from] Box<figment::Error>),

    /// A platform identifier was malformed.
    #[error("invalid platform '{platform}': {reason}")]
    InvalidPlatform {
        /// The rejected identifier.
        platform: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A manifest value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The pinned upstream package set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    /// Package-set name (e.g. `nixpkgs`).
    #[serde(default = "default_upstream_name")]
    pub name: String,

    /// The pinned revision. Resolution is a function of this value.
    #[serde(default = "default_revision", deserialize_with = "string_or_number")]
    pub revision: String,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            name: default_upstream_name(),
            revision: default_revision(),
        }
    }
}

fn default_upstream_name() -> String {
    "nixpkgs".to_string()
}

fn default_revision() -> String {
    "nixos-24.11".to_string()
}

/// The interpreter the wrapped scripts run under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpreter {
    /// Executable name or path.
    #[serde(default = "default_program")]
    pub program: String,

    /// Pinned version. A reported version matches when it equals this value
    /// or extends it by further `.`-separated components.
    #[serde(
        default = "default_interpreter_version",
        deserialize_with = "string_or_number"
    )]
    pub version: String,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            program: default_program(),
            version: default_interpreter_version(),
        }
    }
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_interpreter_version() -> String {
    "3.12".to_string()
}

/// A third-party library installed alongside the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name.
    pub name: String,

    /// Pinned version, matched like [`Interpreter::version`].
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,

    /// Importable module name, when it differs from the package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Package {
    /// The module to import when probing for this package.
    pub fn module(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.name)
    }
}

fn default_packages() -> Vec<Package> {
    vec![Package {
        name: "requests".to_string(),
        version: "2.32".to_string(),
        module: None,
    }]
}

fn default_systems() -> Vec<Platform> {
    DEFAULT_SYSTEMS
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn default_wrappers() -> Vec<String> {
    vec!["cp".to_string(), "kattis".to_string()]
}

/// Accepts versions written as numbers (`version = 3.12`, or an unquoted
/// environment override) as well as strings.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct VersionVisitor;

    impl serde::de::Visitor<'_> for VersionVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a version string or number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(VersionVisitor)
}

// ---------------------------------------------------------------------------
// Main manifest struct
// ---------------------------------------------------------------------------

/// The full environment manifest, corresponding to `cpshell.toml`.
///
/// Every field has a default, so a partial file (or none at all) yields the
/// stock competitive-programming environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// The pinned package set.
    #[serde(default)]
    pub upstream: Upstream,

    /// Platforms the environment can be provisioned for.
    #[serde(default = "default_systems")]
    pub systems: Vec<Platform>,

    /// The interpreter runtime.
    #[serde(default)]
    pub interpreter: Interpreter,

    /// Third-party libraries.
    #[serde(default = "default_packages")]
    pub packages: Vec<Package>,

    /// Command wrappers to put on `PATH`.
    #[serde(default = "default_wrappers")]
    pub wrappers: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            upstream: Upstream::default(),
            systems: default_systems(),
            interpreter: Interpreter::default(),
            packages: default_packages(),
            wrappers: default_wrappers(),
        }
    }
}

impl Manifest {
    /// Returns `true` if `platform` is one of the manifest's systems.
    pub fn supports(&self, platform: &Platform) -> bool {
        self.systems.contains(platform)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("upstream.name", &self.upstream.name)?;
        require_non_empty("upstream.revision", &self.upstream.revision)?;
        require_non_empty("interpreter.program", &self.interpreter.program)?;
        require_non_empty("interpreter.version", &self.interpreter.version)?;

        if self.systems.is_empty() {
            return Err(invalid("systems", "at least one platform is required"));
        }
        require_unique("systems", self.systems.iter().map(Platform::as_str))?;

        for (i, pkg) in self.packages.iter().enumerate() {
            require_non_empty(&format!("packages[{i}].name"), &pkg.name)?;
            require_non_empty(&format!("packages[{i}].version"), &pkg.version)?;
        }
        require_unique("packages", self.packages.iter().map(|p| p.name.as_str()))?;

        for (i, name) in self.wrappers.iter().enumerate() {
            require_non_empty(&format!("wrappers[{i}]"), name)?;
        }
        require_unique("wrappers", self.wrappers.iter().map(String::as_str))?;

        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    Ok(())
}

fn require_unique<'a>(key: &str, values: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(invalid(key, format!("duplicate entry '{value}'")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered figment for the manifest of the repository at `root`.
pub fn manifest_figment(root: &Path) -> Figment {
    Figment::from(Serialized::defaults(Manifest::default()))
        .merge(Toml::file(root.join(MANIFEST_FILE)))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .split("__")
                .filter(|key| {
                    !RESERVED_ENV_KEYS
                        .iter()
                        .any(|reserved| key.as_str().eq_ignore_ascii_case(reserved))
                }),
        )
}

/// Load and validate the manifest of the repository at `root`.
///
/// A missing `cpshell.toml` is not an error: defaults and environment
/// overrides still apply.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if a layer fails to parse or has the wrong
/// shape, or [`ConfigError::InvalidValue`] if validation fails.
pub fn load_manifest(root: &Path) -> Result<Manifest> {
    let manifest: Manifest = manifest_figment(root).extract()?;
    manifest.validate()?;
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_manifest() {
        let m = Manifest::default();
        assert_eq!(m.upstream.name, "nixpkgs");
        assert_eq!(m.interpreter.program, "python3");
        assert_eq!(m.packages.len(), 1);
        assert_eq!(m.packages[0].name, "requests");
        assert_eq!(m.packages[0].module(), "requests");
        assert_eq!(m.wrappers, vec!["cp", "kattis"]);
        assert_eq!(m.systems.len(), DEFAULT_SYSTEMS.len());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let m = load_manifest(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(m, Manifest::default());
            Ok(())
        });
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                MANIFEST_FILE,
                r#"
                [upstream]
                revision = "0123abcd"

                [interpreter]
                version = "3.11"
                "#,
            )?;
            let m = load_manifest(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(m.upstream.revision, "0123abcd");
            assert_eq!(m.upstream.name, "nixpkgs");
            assert_eq!(m.interpreter.version, "3.11");
            assert_eq!(m.interpreter.program, "python3");
            assert_eq!(m.wrappers, vec!["cp", "kattis"]);
            Ok(())
        });
    }

    #[test]
    fn test_file_arrays_replace_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                MANIFEST_FILE,
                r#"
                systems = ["x86_64-linux"]
                wrappers = ["kattis"]

                [[packages]]
                name = "pyyaml"
                version = "6.0"
                module = "yaml"
                "#,
            )?;
            let m = load_manifest(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(m.systems, vec!["x86_64-linux".parse::<Platform>().unwrap()]);
            assert_eq!(m.wrappers, vec!["kattis"]);
            assert_eq!(m.packages.len(), 1);
            assert_eq!(m.packages[0].module(), "yaml");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(MANIFEST_FILE, "[interpreter]\nprogram = \"python3.11\"\n")?;
            jail.set_env("CPSHELL_INTERPRETER__PROGRAM", "pypy3");
            jail.set_env("CPSHELL_PLATFORM", "x86_64-linux");
            jail.set_env("CPSHELL_LOG", "debug");
            let m = load_manifest(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(m.interpreter.program, "pypy3");
            Ok(())
        });
    }

    #[test]
    fn test_numeric_versions_are_accepted() {
        Jail::expect_with(|jail| {
            jail.create_file(
                MANIFEST_FILE,
                "[[packages]]\nname = \"requests\"\nversion = 2.32\n",
            )?;
            jail.set_env("CPSHELL_INTERPRETER__VERSION", "3.12");
            jail.set_env("CPSHELL_UPSTREAM__REVISION", "24.11");
            let m = load_manifest(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(m.interpreter.version, "3.12");
            assert_eq!(m.packages[0].version, "2.32");
            assert_eq!(m.upstream.revision, "24.11");
            Ok(())
        });
    }

    #[test]
    fn test_load_error_message_leaves_detail_to_source() {
        Jail::expect_with(|jail| {
            jail.create_file(MANIFEST_FILE, "systems = 3\n")?;
            let err = load_manifest(jail.directory()).unwrap_err();
            assert_eq!(err.to_string(), "failed to load manifest");
            assert!(std::error::Error::source(&err).is_some());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_platform_in_file() {
        Jail::expect_with(|jail| {
            jail.create_file(MANIFEST_FILE, "systems = [\"linux\"]\n")?;
            let err = load_manifest(jail.directory()).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)), "got {err:?}");
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut m = Manifest::default();
        m.wrappers.push("cp".to_string());
        match m.validate().unwrap_err() {
            ConfigError::InvalidValue { key, reason } => {
                assert_eq!(key, "wrappers");
                assert!(reason.contains("'cp'"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let mut m = Manifest::default();
        m.upstream.revision = "  ".to_string();
        assert!(m.validate().is_err());

        let mut m = Manifest::default();
        m.systems.clear();
        assert!(m.validate().is_err());

        let mut m = Manifest::default();
        m.packages[0].version = String::new();
        match m.validate().unwrap_err() {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "packages[0].version"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_supports() {
        let m = Manifest::default();
        assert!(m.supports(&"aarch64-darwin".parse().unwrap()));
        assert!(!m.supports(&"riscv64-linux".parse().unwrap()));
    }
}
