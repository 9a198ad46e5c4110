//! Jotter CLI - notes from the terminal that keep working offline
//!
//! Changes made while the backend is unreachable are queued locally and
//! replayed the next time a command reaches it.

mod cli;
mod commands;
mod error;


use clap::Parser;
use jotter_core::ClientConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth::{run_login, run_logout, run_register};
use crate::commands::common::{load_config, open_client};
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jotter=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.api_url, cli.data_dir)?;

    match cli.command {
        Commands::Config { command } => run_config(command, &config, &ClientConfig::default_path()),
        command => run_client_command(command, &config).await,
    }
}

async fn run_client_command(command: Commands, config: &ClientConfig) -> Result<(), CliError> {
    let client = open_client(config)?;
    match command {
        Commands::Login { email, password } => run_login(&client, &email, password).await,
        Commands::Register { email, password } => run_register(&client, &email, password).await,
        Commands::Logout => run_logout(&client).await,
        Commands::List {
            query,
            visibility,
            json,
        } => run_list(&client, query, visibility, json).await,
        Commands::Show { id, json } => run_show(&client, &id, json).await,
        Commands::Add {
            title,
            content,
            tags,
            visibility,
        } => run_add(&client, &title, content, tags.as_deref(), visibility).await,
        Commands::Edit {
            id,
            title,
            content,
            tags,
            visibility,
        } => run_edit(&client, &id, title, content, tags.as_deref(), visibility).await,
        Commands::Delete { id } => run_delete(&client, &id).await,
        Commands::Sync => run_sync(&client).await,
        Commands::Status { json } => run_status(&client, json).await,
        Commands::Queue { json } => run_queue(&client, json).await,
        Commands::Config { command } => run_config(command, config, &ClientConfig::default_path()),
    }
}
