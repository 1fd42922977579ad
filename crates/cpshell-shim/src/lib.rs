//! Transparent command wrappers.
//!
//! A wrapper resolves the git root of the current working directory, joins a
//! fixed script path onto it and hands the process over to that script with
//! the original arguments. The wrapper never parses, buffers or retries
//! anything: the script's streams are the caller's streams and its exit code
//! is the wrapper's exit code.
//!
//! Only two failures belong to the wrapper itself, each with a reserved exit
//! code: no enclosing repository ([`EXIT_NOT_A_REPOSITORY`]) and a script
//! that cannot be launched ([`EXIT_SCRIPT_NOT_FOUND`]).

pub mod error;
pub mod launch;
pub mod wrapper;

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

pub use error::{EXIT_NOT_A_REPOSITORY, EXIT_SCRIPT_NOT_FOUND, Result, ShimError, render_chain};
pub use launch::LaunchMode;
pub use wrapper::{CP, KATTIS, WRAPPERS, Wrapper, lookup};

/// Environment variable holding a tracing filter for wrapper diagnostics.
pub const LOG_ENV: &str = "CPSHELL_LOG";

/// Resolve the script `wrapper` would launch when invoked from `cwd`.
pub fn resolve_target(wrapper: &Wrapper, cwd: &Path) -> Result<PathBuf> {
    let root = cpshell_git::resolve_repo_root(cwd)?;
    Ok(wrapper.script_path(&root))
}

/// Resolve, check and launch the wrapper's script, running it in `cwd`.
///
/// Returns the exit code to relay. With [`LaunchMode::Exec`] on Unix a
/// successful launch never returns.
pub fn dispatch(
    wrapper: &Wrapper,
    cwd: &Path,
    args: Vec<OsString>,
    mode: LaunchMode,
) -> Result<u8> {
    let script = resolve_target(wrapper, cwd)?;
    launch::check_launchable(&script)?;
    tracing::debug!(
        wrapper = wrapper.name,
        script = %script.display(),
        argc = args.len(),
        "dispatching"
    );
    launch::launch(&script, cwd, args, mode)
}

/// Entry point shared by the wrapper binaries.
pub fn run(wrapper: &Wrapper) -> ExitCode {
    init_logging();

    let args: Vec<OsString> = env::args_os().skip(1).collect();
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("{}: cannot determine working directory: {e}", wrapper.name);
            return ExitCode::from(EXIT_NOT_A_REPOSITORY);
        }
    };

    match dispatch(wrapper, &cwd, args, LaunchMode::native()) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report(wrapper, &err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Install a stderr subscriber when `CPSHELL_LOG` is set; stay silent otherwise.
fn init_logging() {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn report(wrapper: &Wrapper, err: &ShimError) {
    match err {
        // git already explained itself; relay its words untouched.
        ShimError::NotARepository { diagnostic } if !diagnostic.is_empty() => {
            let _ = std::io::stderr().write_all(diagnostic);
        }
        _ => eprintln!("{}: {}", wrapper.name, render_chain(err)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    /// Creates a git repo whose `solver/cp.py` records its argv and cwd.
    fn repo_with_recorder(exit_code: i32) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success());

        let solver = dir.path().join("solver");
        fs::create_dir_all(&solver).unwrap();
        let script = solver.join("cp.py");
        let log = dir.path().join("calls.log");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\npwd > '{log}'\nfor a in \"$@\"; do printf '%s\\n' \"$a\" >> '{log}'; done\nexit {exit_code}\n",
                log = log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        dir
    }

    fn recorded(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls.log"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn forwards_arguments_from_nested_directory() {
        let repo = repo_with_recorder(0);
        let nested = repo.path().join("kattis").join("hello");
        fs::create_dir_all(&nested).unwrap();

        let code = dispatch(&CP, &nested, os_args(&["foo", "bar"]), LaunchMode::Spawn).unwrap();
        assert_eq!(code, 0);

        let lines = recorded(repo.path());
        assert_eq!(
            fs::canonicalize(&lines[0]).unwrap(),
            nested.canonicalize().unwrap(),
            "working directory must be left unchanged"
        );
        assert_eq!(&lines[1..], ["foo", "bar"]);
    }

    #[test]
    fn forwards_flags_and_empty_arguments_verbatim() {
        let repo = repo_with_recorder(0);
        let args = ["--help", "", "--", "a b", "-x=1"];

        dispatch(&CP, repo.path(), os_args(&args), LaunchMode::Spawn).unwrap();
        assert_eq!(&recorded(repo.path())[1..], args);
    }

    #[test]
    fn relays_script_exit_code() {
        let repo = repo_with_recorder(3);
        let code = dispatch(&CP, repo.path(), Vec::new(), LaunchMode::Spawn).unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn deleted_script_is_reported() {
        let repo = repo_with_recorder(0);
        fs::remove_file(repo.path().join("solver").join("cp.py")).unwrap();

        let err = dispatch(&CP, repo.path(), Vec::new(), LaunchMode::Spawn).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SCRIPT_NOT_FOUND);
        assert!(!repo.path().join("calls.log").exists());
    }

    #[test]
    fn missing_kattis_script_is_reported() {
        let repo = repo_with_recorder(0);
        let err = dispatch(&KATTIS, repo.path(), Vec::new(), LaunchMode::Spawn).unwrap_err();
        match err {
            ShimError::ScriptNotFound { path, .. } => {
                assert!(path.ends_with("kattis/kattis.py"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn resolve_target_points_at_root_script() {
        let repo = repo_with_recorder(0);
        let target = resolve_target(&CP, repo.path()).unwrap();
        assert_eq!(
            target.canonicalize().unwrap(),
            repo.path().join("solver/cp.py").canonicalize().unwrap()
        );
    }
}
