//! Goodnight CLI - log bedtimes to a log shared by two
//!
//! Running `goodnight` with no subcommand logs a bedtime for this device's
//! chosen identity.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::identity::run_identity;
use crate::commands::list::run_list;
use crate::commands::session::run_session;
use crate::commands::sleep::run_sleep;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "goodnight=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        command,
        db_path,
        profile,
        offline,
    } = Cli::parse();
    let context = || CliContext::resolve(db_path.clone(), profile.as_deref(), offline);

    match command {
        None | Some(Commands::Sleep) => run_sleep(&context()?).await?,
        Some(Commands::List { json }) => run_list(&context()?, json).await?,
        Some(Commands::Delete { id, yes }) => run_delete(&context()?, &id, yes).await?,
        Some(Commands::Watch { interval }) => run_watch(&context()?, interval).await?,
        Some(Commands::Identity { command }) => run_identity(&context()?, command)?,
        Some(Commands::Session { command }) => run_session(&context()?, command).await?,
        Some(Commands::Config { command }) => {
            run_config(command, profile.as_deref(), db_path.clone(), offline)?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
