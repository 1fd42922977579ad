//! `cpshell which` -- print the script a wrapper would launch.

use anyhow::{Context, Result, bail};
use cpshell_shim::{WRAPPERS, launch::check_launchable, lookup, render_chain, resolve_target};

use crate::cli::WhichArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `cpshell which` command.
pub fn run(ctx: &RuntimeContext, args: &WhichArgs) -> Result<()> {
    let Some(wrapper) = lookup(&args.command) else {
        let known: Vec<&str> = WRAPPERS.iter().map(|w| w.name).collect();
        bail!(
            "'{}' is not a cpshell wrapper (known: {})",
            args.command,
            known.join(", ")
        );
    };

    let script = match &ctx.root_override {
        Some(root) => wrapper.script_path(root),
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            resolve_target(wrapper, &cwd)?
        }
    };
    let launchable = check_launchable(&script);

    if ctx.json {
        output_json(&serde_json::json!({
            "command": wrapper.name,
            "script": script.display().to_string(),
            "launchable": launchable.is_ok(),
        }))?;
    } else {
        println!("{}", script.display());
        if let Err(e) = launchable {
            if !ctx.quiet {
                eprintln!("warning: {}", render_chain(&e));
            }
        }
    }
    Ok(())
}
