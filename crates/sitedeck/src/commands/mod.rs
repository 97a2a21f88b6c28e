//! Command handlers, one module per top-level subcommand.

pub mod builds;
pub mod config_cmd;
pub mod deploys;
pub mod env;
pub mod sites;
pub mod util;

use sitedeck_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a platform command to its handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites(args) => sites::handle(console, args, global).await,
        Command::Deploys(args) => deploys::handle(console, args, global).await,
        Command::Builds(args) => builds::handle(console, args, global).await,
        Command::Env(args) => env::handle(console, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
