//! Dispatches the parsed command.

use super::handlers::ServeCommandHandler;
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Runs the command selected on the command line. No subcommand means
/// `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    warn_on_privileged_bind(&settings);

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
    }
}

fn warn_on_privileged_bind(settings: &Settings) {
    if settings.server.port < 1024 && settings.server.host == "0.0.0.0" {
        eprintln!(
            "Warning: Binding to 0.0.0.0 on port {} requires root privileges",
            settings.server.port
        );
    }
}
