//! `cpshell-cp` -- installed as `cp` in a profile; runs `solver/cp.py` from
//! the enclosing git repository.

use std::process::ExitCode;

fn main() -> ExitCode {
    cpshell_shim::run(&cpshell_shim::CP)
}
