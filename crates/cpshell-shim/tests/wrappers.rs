//! End-to-end tests for the `cp` and `kattis` wrapper binaries.
//!
//! Each test builds a throwaway git repository with `/bin/sh` stand-ins for
//! the Python scripts and runs the cargo-built wrappers against it via
//! `assert_cmd`.

#![cfg(unix)]

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cp() -> Command {
    Command::cargo_bin("cpshell-cp").unwrap()
}

fn kattis() -> Command {
    Command::cargo_bin("cpshell-kattis").unwrap()
}

fn git_init(dir: &Path) {
    let status = std::process::Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success());
}

fn write_script(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A repository whose scripts echo their name, cwd and arguments.
fn echo_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    let body = r#"echo "script=$0"
echo "cwd=$(pwd -P)"
for a in "$@"; do echo "arg=$a"; done"#;
    write_script(tmp.path(), "solver/cp.py", body);
    write_script(tmp.path(), "kattis/kattis.py", body);
    tmp
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn cp_from_two_levels_down() {
    let repo = echo_repo();
    let nested = repo.path().join("kattis").join("hello");
    fs::create_dir_all(&nested).unwrap();
    let nested_real = nested.canonicalize().unwrap();

    let output = cp()
        .args(["foo", "bar"])
        .current_dir(&nested)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(
        lines[0].ends_with("/solver/cp.py"),
        "unexpected script: {}",
        lines[0]
    );
    assert_eq!(lines[1], format!("cwd={}", nested_real.display()));
    assert_eq!(&lines[2..], ["arg=foo", "arg=bar"]);
}

#[test]
fn kattis_dispatches_to_its_own_script() {
    let repo = echo_repo();
    kattis()
        .args(["test", "hello"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("/kattis/kattis.py"))
        .stdout(predicate::str::contains("arg=test\narg=hello\n"));
}

#[test]
fn wrapper_flags_are_not_interpreted() {
    let repo = echo_repo();
    cp().args(["--help", "--version", "--"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("arg=--help\narg=--version\narg=--\n"));
}

#[test]
fn stdin_and_stderr_are_inherited() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    write_script(tmp.path(), "solver/cp.py", "read line; echo \"got $line\" >&2");

    cp().current_dir(tmp.path())
        .write_stdin("3 4\n")
        .assert()
        .success()
        .stdout("")
        .stderr("got 3 4\n");
}

#[test]
fn exit_code_is_relayed() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    write_script(tmp.path(), "solver/cp.py", "exit 3");

    cp().current_dir(tmp.path()).assert().code(3);
}

#[test]
fn non_utf8_arguments_are_forwarded_byte_for_byte() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    let out = tmp.path().join("arg.bin");
    write_script(
        tmp.path(),
        "solver/cp.py",
        &format!("printf '%s' \"$1\" > '{}'", out.display()),
    );

    cp().arg(OsStr::from_bytes(b"a\xffb"))
        .current_dir(tmp.path())
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), b"a\xffb");
}

#[test]
fn signals_reach_the_script() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    let ready = tmp.path().join("ready");
    let trapped = tmp.path().join("trapped");
    write_script(
        tmp.path(),
        "solver/cp.py",
        &format!(
            "trap 'touch \"{trapped}\"; exit 42' TERM\n\
             touch \"{ready}\"\n\
             while :; do sleep 1 & wait $!; done",
            trapped = trapped.display(),
            ready = ready.display()
        ),
    );

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_cpshell-cp"))
        .current_dir(tmp.path())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready.exists() {
        assert!(Instant::now() < deadline, "script never started");
        thread::sleep(Duration::from_millis(20));
    }

    let status = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(42));
    assert!(trapped.exists());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn outside_repository_fails_with_git_diagnostic() {
    let tmp = TempDir::new().unwrap();
    let ceiling = tmp.path().parent().unwrap();

    cp().arg("new")
        .current_dir(tmp.path())
        .env("GIT_CEILING_DIRECTORIES", ceiling)
        .assert()
        .code(128)
        .stdout("")
        .stderr(predicate::str::starts_with("fatal: not a git repository"));
}

#[test]
fn missing_script_fails_with_reserved_code() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());

    kattis()
        .current_dir(tmp.path())
        .assert()
        .code(127)
        .stderr(predicate::str::contains("kattis: cannot launch"))
        .stderr(predicate::str::contains("kattis.py"));
}

#[test]
fn non_executable_script_fails_with_reserved_code() {
    let tmp = TempDir::new().unwrap();
    git_init(tmp.path());
    write_script(tmp.path(), "solver/cp.py", "exit 0");
    let script = tmp.path().join("solver/cp.py");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

    cp().current_dir(tmp.path())
        .assert()
        .code(127)
        .stderr(predicate::str::contains("not executable"));
}

#[test]
fn logging_is_opt_in() {
    let repo = echo_repo();
    cp().current_dir(repo.path())
        .env_remove("CPSHELL_LOG")
        .assert()
        .success()
        .stderr("");

    cp().current_dir(repo.path())
        .env("CPSHELL_LOG", "debug")
        .assert()
        .success()
        .stderr(predicate::str::contains("dispatching"));
}
