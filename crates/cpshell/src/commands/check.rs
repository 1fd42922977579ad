//! `cpshell check` -- verify the lockfile and probe the host.
//!
//! Runs every check and reports each as `[OK]`, `[WARN]` or `[FAIL]`:
//! - git is available
//! - `cpshell.lock` exists and matches a fresh resolution
//! - every supported platform is locked
//! - the host is a supported platform
//! - the interpreter and each library report their pinned versions
//! - each wrapper's script is present and executable
//!
//! Any `[FAIL]` makes the command exit non-zero.

use std::path::Path;

use anyhow::{Result, bail};
use cpshell_config::{Manifest, Platform};
use cpshell_env::{diff_lock, probe_interpreter, probe_library, read_lockfile, unlocked_platforms};
use cpshell_shim::launch::check_launchable;
use cpshell_shim::render_chain;
use cpshell_ui::{CheckStatus, render_check};
use serde::Serialize;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// The result of one check.
#[derive(Debug, Clone, Serialize)]
struct Check {
    name: String,
    #[serde(serialize_with = "status_str")]
    status: CheckStatus,
    detail: String,
}

fn status_str<S: serde::Serializer>(status: &CheckStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(status.as_str())
}

impl Check {
    fn new(status: CheckStatus, name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }
}

/// Execute the `cpshell check` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let (root, manifest) = ctx.manifest()?;

    let mut checks = vec![check_git(&root)];
    checks.extend(check_lockfile(&root, &manifest));
    checks.push(check_host(&manifest));
    checks.extend(check_interpreter(&manifest));
    checks.extend(check_wrappers(&root, &manifest));

    let failed = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Fail)
        .count();
    let warned = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warn)
        .count();

    if ctx.json {
        output_json(&serde_json::json!({
            "checks": checks,
            "failed": failed,
            "warnings": warned,
        }))?;
    } else {
        for check in &checks {
            if ctx.quiet && check.status == CheckStatus::Pass {
                continue;
            }
            println!("{}", render_check(check.status, &check.name, &check.detail));
        }
        if !ctx.quiet {
            println!();
            println!("{failed} failed, {warned} warning(s)");
        }
    }

    if failed > 0 {
        bail!("{failed} check(s) failed");
    }
    Ok(())
}

fn check_git(root: &Path) -> Check {
    match cpshell_git::commands::git_command(&["--version"], root) {
        Ok(version) => Check::new(CheckStatus::Pass, "git", version),
        Err(e) => Check::new(CheckStatus::Fail, "git", render_chain(&e)),
    }
}

fn check_lockfile(root: &Path, manifest: &Manifest) -> Vec<Check> {
    let lock = match read_lockfile(root) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            return vec![Check::new(
                CheckStatus::Warn,
                "lockfile",
                "no cpshell.lock; run `cpshell lock`",
            )];
        }
        Err(e) => return vec![Check::new(CheckStatus::Fail, "lockfile", render_chain(&e))],
    };

    let mut checks = Vec::new();
    let diffs = diff_lock(manifest, &lock);
    if diffs.is_empty() {
        checks.push(Check::new(
            CheckStatus::Pass,
            "lockfile",
            format!(
                "matches {}@{}",
                lock.upstream.name, lock.upstream.revision
            ),
        ));
    } else {
        checks.push(Check::new(CheckStatus::Fail, "lockfile", diffs.join("; ")));
    }

    let unlocked = unlocked_platforms(manifest, &lock);
    if !unlocked.is_empty() {
        let names: Vec<&str> = unlocked.iter().map(|p| p.as_str()).collect();
        checks.push(Check::new(
            CheckStatus::Warn,
            "platforms",
            format!("not locked: {}", names.join(", ")),
        ));
    }
    checks
}

fn check_host(manifest: &Manifest) -> Check {
    let host = Platform::host();
    if manifest.supports(&host) {
        Check::new(CheckStatus::Pass, "host", host.to_string())
    } else {
        Check::new(
            CheckStatus::Warn,
            "host",
            format!("{host} is not in the manifest's systems"),
        )
    }
}

fn check_interpreter(manifest: &Manifest) -> Vec<Check> {
    let interpreter = &manifest.interpreter;
    let name = interpreter.program.clone();

    let probe = match probe_interpreter(interpreter) {
        Ok(probe) => probe,
        // Without an interpreter the library probes cannot run either.
        Err(e) => return vec![Check::new(CheckStatus::Fail, name, render_chain(&e))],
    };

    let mut checks = Vec::with_capacity(1 + manifest.packages.len());
    if probe.matches {
        checks.push(Check::new(CheckStatus::Pass, name, probe.banner));
    } else {
        checks.push(Check::new(
            CheckStatus::Fail,
            name,
            format!("{} (pinned {})", probe.banner, interpreter.version),
        ));
    }

    for package in &manifest.packages {
        let check = match probe_library(interpreter, package) {
            Ok(lib) if lib.matches => Check::new(
                CheckStatus::Pass,
                &package.name,
                lib.version.unwrap_or_default(),
            ),
            Ok(lib) => match lib.version {
                Some(v) => Check::new(
                    CheckStatus::Fail,
                    &package.name,
                    format!("{v} (pinned {})", package.version),
                ),
                None => Check::new(
                    CheckStatus::Fail,
                    &package.name,
                    format!("cannot import '{}'", package.module()),
                ),
            },
            Err(e) => Check::new(CheckStatus::Fail, &package.name, render_chain(&e)),
        };
        checks.push(check);
    }
    checks
}

fn check_wrappers(root: &Path, manifest: &Manifest) -> Vec<Check> {
    manifest
        .wrappers
        .iter()
        .map(|name| match cpshell_shim::lookup(name) {
            Some(wrapper) => {
                let script = wrapper.script_path(root);
                match check_launchable(&script) {
                    Ok(()) => Check::new(
                        CheckStatus::Pass,
                        format!("wrapper {name}"),
                        script.display().to_string(),
                    ),
                    Err(e) => Check::new(
                        CheckStatus::Warn,
                        format!("wrapper {name}"),
                        render_chain(&e),
                    ),
                }
            }
            None => Check::new(
                CheckStatus::Fail,
                format!("wrapper {name}"),
                "not shipped with cpshell",
            ),
        })
        .collect()
}
