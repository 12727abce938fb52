//! Command dispatch: bridges CLI args -> dashboard operations -> output formatting.

pub mod images;
pub mod lang;
pub mod settings;
pub mod status;
pub mod util;
pub mod watch;

use dockmon_core::DashboardConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a monitor-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Status(args) => status::status(config, args, global).await,
        Command::Refresh { name } => status::refresh(config, name, global).await,
        Command::Update { name } => status::update(config, name, global).await,
        Command::Health => status::health(config, global).await,
        Command::Prune => images::prune(config, global).await,
        Command::Unused => images::unused(config, global).await,
        Command::Settings(args) => settings::handle(config, args, profile_name, global).await,
        // Lang and Completions are handled before dispatch
        Command::Lang { .. } | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the monitor".into(),
        )),
    }
}
