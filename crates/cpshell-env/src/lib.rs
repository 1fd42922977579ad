//! The cpshell environment provisioner.
//!
//! A [`Manifest`](cpshell_config::Manifest) is resolved per platform into a
//! deterministic [`Resolution`], recorded in a [`Lockfile`], checked against
//! the host by the probes, and materialized as a [`Profile`] whose `bin`
//! directory puts the `cp` and `kattis` wrappers on `PATH`.

pub mod error;
pub mod lock;
pub mod probe;
pub mod profile;
pub mod resolve;
pub mod store_id;

pub use error::{EnvError, Result};
pub use lock::{
    LOCK_FORMAT_VERSION, Lockfile, diff_lock, read_lockfile, unlocked_platforms, verify_lock,
    write_lockfile,
};
pub use probe::{InterpreterProbe, LibraryProbe, probe_interpreter, probe_library};
pub use profile::{PLATFORM_ENV, Profile, ROOT_ENV, default_wrapper_dir, materialize};
pub use resolve::{PackageKind, Resolution, ResolvedPackage, WRAPPER_VERSION, resolve};
pub use store_id::store_id;
