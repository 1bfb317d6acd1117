//! Command-line interface module
//!
//! Argument parsing and one handler per subcommand.

pub mod args;
pub mod init;
pub mod run;
pub mod tools;

pub use args::*;
pub use init::handle_init_command;
pub use run::handle_run_command;
pub use tools::handle_tools_command;
