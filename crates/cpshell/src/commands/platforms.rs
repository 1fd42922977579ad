//! `cpshell platforms` -- list the manifest's supported platforms.

use anyhow::Result;
use cpshell_config::Platform;
use cpshell_env::read_lockfile;
use serde::Serialize;

use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

#[derive(Serialize)]
struct PlatformView<'a> {
    platform: &'a str,
    host: bool,
    locked: bool,
}

/// Execute the `cpshell platforms` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let (root, manifest) = ctx.manifest()?;
    let host = Platform::host();

    // An unreadable lockfile only means nothing shows as locked here;
    // `cpshell check` reports the reason.
    let lock = read_lockfile(&root).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring unreadable lockfile");
        None
    });

    let views: Vec<PlatformView<'_>> = manifest
        .systems
        .iter()
        .map(|p| PlatformView {
            platform: p.as_str(),
            host: *p == host,
            locked: lock.as_ref().is_some_and(|l| l.platforms.contains_key(p)),
        })
        .collect();

    if ctx.json {
        return output_json(&views);
    }

    let mark = |b: bool| (if b { "*" } else { "" }).to_string();
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|v| vec![v.platform.to_string(), mark(v.host), mark(v.locked)])
        .collect();
    output_table(&["PLATFORM", "HOST", "LOCKED"], &rows);
    Ok(())
}
