//! Command handler modules for the CLI.

mod parse;
mod profiles;
mod show_commands;
mod watch;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Watch {
            profile,
            host,
            user,
            port,
            identity,
            jump,
            format,
            count,
            interval_ms,
        } => watch::cmd_watch(
            config_path,
            watch::WatchParams {
                profile: profile.as_deref(),
                host: host.as_deref(),
                user: user.as_deref(),
                port,
                identity: identity.as_deref(),
                jump: jump.as_deref(),
                format,
                count,
                interval_ms,
            },
        ),
        Commands::Parse {
            transport,
            file,
            host,
        } => parse::cmd_parse(transport.into(), &file, &host),
        Commands::Commands { transport } => {
            show_commands::cmd_commands(transport.into());
            Ok(())
        }
        Commands::Profiles { format } => profiles::cmd_profiles(config_path, format),
    }
}
