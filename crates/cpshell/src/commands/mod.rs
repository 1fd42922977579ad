//! Command handlers, one module per subcommand.

pub mod check;
pub mod completion;
pub mod enter;
pub mod lock;
pub mod platforms;
pub mod show;
pub mod version;
pub mod which_cmd;
