//! Diary CLI - Keep a personal diary from the terminal
//!
//! Entries live on the diary backend; images go to the configured asset host.

use clap::{CommandFactory, Parser};

mod cli;
mod commands;
mod config_profiles;
mod error;
mod terminal;
mod token_store;

use cli::{Cli, Commands};
use commands::add::run_add;
use commands::auth_cmd::run_auth;
use commands::completions::run_completions;
use commands::config::run_config;
use commands::delete::run_delete;
use commands::edit::run_edit;
use commands::list::run_list;
use commands::search::run_search;
use commands::show::run_show;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        if !error.is_reported() {
            eprintln!("Error: {error}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,diary=info")),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::List { json }) => run_list(json, profile).await?,
        Some(Commands::Search { term, json }) => run_search(&term, json, profile).await?,
        Some(Commands::Add {
            title,
            description,
            images,
        }) => run_add(title, description, &images, profile).await?,
        Some(Commands::Show { id }) => run_show(&id, profile).await?,
        Some(Commands::Edit {
            id,
            title,
            description,
        }) => run_edit(&id, title, description, profile).await?,
        Some(Commands::Delete { id }) => run_delete(&id, profile).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
