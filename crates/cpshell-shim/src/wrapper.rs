//! The registry of command wrappers.

use std::path::{Path, PathBuf};

/// A command wrapper: a command name bound to a script path relative to the
/// git root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper {
    /// The command name placed on `PATH` inside the environment.
    pub name: &'static str,
    /// The installed binary, `cpshell-<name>`. The profile links `name` to it.
    pub binary: &'static str,
    /// Script location, relative to the repository root, `/`-separated.
    pub script: &'static str,
}

/// `cp` dispatches to the unified solver helper.
pub const CP: Wrapper = Wrapper {
    name: "cp",
    binary: "cpshell-cp",
    script: "solver/cp.py",
};

/// `kattis` dispatches to the Kattis helper.
pub const KATTIS: Wrapper = Wrapper {
    name: "kattis",
    binary: "cpshell-kattis",
    script: "kattis/kattis.py",
};

/// Every wrapper shipped with cpshell, in install order.
pub const WRAPPERS: &[Wrapper] = &[CP, KATTIS];

/// Look up a wrapper by command name.
pub fn lookup(name: &str) -> Option<&'static Wrapper> {
    WRAPPERS.iter().find(|w| w.name == name)
}

impl Wrapper {
    /// Join the script's relative path onto `root`.
    pub fn script_path(&self, root: &Path) -> PathBuf {
        self.script
            .split('/')
            .fold(root.to_path_buf(), |path, part| path.join(part))
    }
}
