//! `cpshell` -- reproducible competitive-programming shells.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Set while `cpshell enter` waits on a child; Ctrl+C then belongs to the child.
pub static CHILD_RUNNING: AtomicBool = AtomicBool::new(false);

fn main() {
    let _ = ctrlc::set_handler(|| {
        if !CHILD_RUNNING.load(Ordering::SeqCst) {
            std::process::exit(130);
        }
    });

    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);
    init_logging(ctx.verbose);

    let result = match cli.command {
        Some(Commands::Enter(args)) => commands::enter::run(&ctx, &args),
        Some(Commands::Lock(args)) => commands::lock::run(&ctx, &args),
        Some(Commands::Check) => commands::check::run(&ctx),
        Some(Commands::Show(args)) => commands::show::run(&ctx, &args),
        Some(Commands::Which(args)) => commands::which_cmd::run(&ctx, &args),
        Some(Commands::Platforms) => commands::platforms::run(&ctx),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, &args),
        Some(Commands::Version) => commands::version::run(&ctx),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// `--verbose` turns on debug logging for cpshell crates; otherwise
/// `CPSHELL_LOG` is honored if set, and nothing is logged by default.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cpshell=debug,cpshell_env=debug,cpshell_git=debug,cpshell_lockfile=debug")
    } else {
        match EnvFilter::try_from_env(cpshell_shim::LOG_ENV) {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
