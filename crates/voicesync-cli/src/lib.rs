//! Terminal front end for voicesync.
//!
//! [`bootstrap`] composes the orchestrator from settings; [`run`] dispatches
//! a parsed [`Cli`] to its handler.

use anyhow::Result;
use clap::CommandFactory;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::{Cli, VoiceArgs};

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(cli.voice.to_settings())?;

    match command {
        Commands::Speak { text } => handlers::speak::execute(ctx, &text.join(" ")).await,
        Commands::Interactive => handlers::interactive::execute(ctx).await,
    }
}
