//! `cpshell version` -- print version, build info, and platform.

use anyhow::Result;
use cpshell_config::Platform;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Version string, shared by the wrappers installed alongside cpshell.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier, overridable at build time.
const BUILD: &str = {
    match option_env!("CPSHELL_BUILD") {
        Some(b) => b,
        None => "dev",
    }
};

/// Execute the `cpshell version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let host = Platform::host();

    if ctx.json {
        output_json(&serde_json::json!({
            "version": VERSION,
            "build": BUILD,
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "platform": host.as_str(),
        }))?;
    } else {
        println!("cpshell version {VERSION} ({BUILD}) {host}");
    }

    Ok(())
}
