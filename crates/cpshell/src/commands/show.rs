//! `cpshell show` -- display the resolved package set for a platform.

use anyhow::Result;
use cpshell_env::{read_lockfile, resolve};
use cpshell_ui::{render_accent, render_bold, render_muted};

use crate::cli::ShowArgs;
use crate::context::{RuntimeContext, select_platform};
use crate::output::{output_json, output_table};

/// Execute the `cpshell show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let (root, manifest) = ctx.manifest()?;
    let platform = select_platform(args.platform.as_deref())?;
    let resolution = resolve(&manifest, &platform)?;

    if ctx.json {
        return output_json(&resolution);
    }

    println!(
        "{} {}",
        render_bold(resolution.platform.as_str()),
        render_muted(&format!(
            "{}@{}",
            resolution.upstream.name, resolution.upstream.revision
        ))
    );
    println!();

    let rows: Vec<Vec<String>> = resolution
        .packages
        .iter()
        .map(|p| {
            vec![
                p.kind.to_string(),
                p.name.clone(),
                p.version.clone(),
                p.store_id.clone(),
            ]
        })
        .collect();
    output_table(&["KIND", "NAME", "VERSION", "STORE ID"], &rows);

    if !ctx.quiet {
        let locked = match read_lockfile(&root)? {
            Some(lock) => match lock.resolution(&platform) {
                Some(locked) if locked == resolution => "locked",
                Some(_) => "lockfile out of date",
                None => "not locked",
            },
            None => "no lockfile",
        };
        println!();
        println!(
            "{} {}",
            render_accent(&format!("{} package(s)", resolution.packages.len())),
            render_muted(&format!("({locked})"))
        );
    }
    Ok(())
}
