//! `cpshell enter` -- open a shell or run a command inside the environment.
//!
//! The manifest is resolved for the requested platform and the wrappers are
//! linked into the platform's profile. The interpreter and every library
//! must report their pinned versions (unless `--allow-mismatch`); then the
//! interpreter banner is printed and the shell (or `-c` command) runs with
//! the profile first on `PATH`. cpshell exits with the child's status.

use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use cpshell_config::Manifest;
use cpshell_env::{
    default_wrapper_dir, materialize, probe_interpreter, probe_library, read_lockfile, resolve,
    verify_lock,
};

use cpshell_shim::render_chain;

use crate::CHILD_RUNNING;
use crate::cli::EnterArgs;
use crate::context::{RuntimeContext, select_platform};

/// Execute the `cpshell enter` command.
pub fn run(ctx: &RuntimeContext, args: &EnterArgs) -> Result<()> {
    let (root, manifest) = ctx.manifest()?;
    let platform = select_platform(args.platform.as_deref())?;
    let resolution = resolve(&manifest, &platform)?;

    if !ctx.quiet {
        warn_if_stale(&root, &manifest);
    }

    let wrapper_dir = match &args.wrapper_dir {
        Some(dir) => dir.clone(),
        None => default_wrapper_dir()?,
    };
    let profile = materialize(&root, &resolution, &wrapper_dir)
        .with_context(|| format!("failed to provision {platform}"))?;

    verify_pins(&manifest, ctx.quiet, args.allow_mismatch)?;

    let mut cmd = match &args.command {
        Some(program) => {
            let mut cmd = profile.command(program)?;
            cmd.args(&args.args);
            cmd
        }
        None => profile.command(login_shell())?,
    };

    tracing::debug!(?cmd, "entering environment");
    CHILD_RUNNING.store(true, Ordering::SeqCst);
    let status = cmd.status();
    CHILD_RUNNING.store(false, Ordering::SeqCst);
    let status = status.with_context(|| format!("failed to run {:?}", cmd.get_program()))?;

    let code = cpshell_shim::launch::exit_code_from_status(status);
    tracing::debug!(code, "environment exited");
    if code != 0 {
        std::process::exit(i32::from(code));
    }
    Ok(())
}

/// `$SHELL`, falling back to the platform's default shell.
fn login_shell() -> OsString {
    env::var_os("SHELL")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| OsString::from(if cfg!(windows) { "cmd.exe" } else { "/bin/sh" }))
}

/// Refuse to enter when the host does not honor the manifest's pins.
///
/// The interpreter banner goes to stderr so `-c` output stays clean.
fn verify_pins(manifest: &Manifest, quiet: bool, allow_mismatch: bool) -> Result<()> {
    let problems = match probe_pins(manifest) {
        Ok((banner, problems)) => {
            if !quiet {
                eprintln!("{banner}");
            }
            problems
        }
        Err(e) => vec![format!("{e:#}")],
    };
    if problems.is_empty() {
        return Ok(());
    }
    if allow_mismatch {
        if !quiet {
            for problem in &problems {
                eprintln!("warning: {problem}");
            }
        }
        return Ok(());
    }
    bail!(
        "environment does not match the manifest:\n  {}\n(pass --allow-mismatch to enter anyway)",
        problems.join("\n  ")
    )
}

/// The interpreter banner plus one line per pin the host does not honor.
fn probe_pins(manifest: &Manifest) -> Result<(String, Vec<String>)> {
    let interpreter = &manifest.interpreter;
    let probe = probe_interpreter(interpreter)?;

    let mut problems = Vec::new();
    if !probe.matches {
        problems.push(format!(
            "{} reports {}, pinned {}",
            interpreter.program,
            probe.version.as_deref().unwrap_or("no version"),
            interpreter.version
        ));
    }
    for package in &manifest.packages {
        let lib = probe_library(interpreter, package)?;
        if lib.matches {
            continue;
        }
        problems.push(match lib.version {
            Some(v) => format!("{} {v}, pinned {}", package.name, package.version),
            None => format!(
                "cannot import '{}' (pinned {} {})",
                package.module(),
                package.name,
                package.version
            ),
        });
    }
    Ok((probe.banner, problems))
}

fn warn_if_stale(root: &Path, manifest: &Manifest) {
    match read_lockfile(root) {
        Ok(Some(lock)) if verify_lock(manifest, &lock).is_err() => {
            eprintln!("warning: cpshell.lock is out of date; run `cpshell lock`");
        }
        Ok(_) => {}
        Err(e) => eprintln!("warning: {}", render_chain(&e)),
    }
}
