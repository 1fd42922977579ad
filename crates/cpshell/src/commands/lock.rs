//! `cpshell lock` -- resolve the manifest and write `cpshell.lock`.

use anyhow::{Context, Result};
use cpshell_config::Platform;
use cpshell_env::{Lockfile, read_lockfile, write_lockfile};

use crate::cli::LockArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `cpshell lock` command.
pub fn run(ctx: &RuntimeContext, args: &LockArgs) -> Result<()> {
    let (root, manifest) = ctx.manifest()?;

    let only = args
        .platforms
        .iter()
        .map(|p| {
            p.parse::<Platform>()
                .with_context(|| format!("bad --platform value '{p}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    // A full relock starts from scratch; a partial one keeps the rest.
    let existing = if only.is_empty() {
        None
    } else {
        read_lockfile(&root).context("failed to read existing lockfile")?
    };

    let lock = Lockfile::refresh(existing, &manifest, &only)?;
    let path = write_lockfile(&root, &lock)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "path": path.display().to_string(),
            "upstream": lock.upstream,
            "platforms": lock.platforms.keys().map(Platform::as_str).collect::<Vec<_>>(),
        }))?;
    } else if !ctx.quiet {
        println!(
            "Locked {} platform(s) at {}@{} in {}",
            lock.platforms.len(),
            lock.upstream.name,
            lock.upstream.revision,
            path.display()
        );
    }
    Ok(())
}
