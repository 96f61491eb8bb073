//! Jotin CLI - capture and browse fleeting notes from the terminal
//!
//! Drives the same list and capture surfaces a desktop shell would mount,
//! backed by the JSON note store.

mod cli;
mod commands;
mod error;
mod host;
mod native_clipboard;

use clap::{CommandFactory, Parser};
use jotin_backend::resolve_data_dir;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::copy::run_copy;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::theme::run_theme;
use crate::error::CliError;
use crate::host::{load_config, Host};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let host = Host::open(&data_dir, config)?;
    host.list().reveal().await;

    let result = dispatch(cli.command, &cli.note, &host).await;
    host.list().hide().await;
    result
}

async fn dispatch(command: Option<Commands>, note: &[String], host: &Host) -> Result<(), CliError> {
    match command {
        Some(Commands::Add { content }) => run_add(&content, host).await,
        Some(Commands::List {
            search,
            limit,
            json,
        }) => run_list(search.as_deref(), limit, json, host).await,
        Some(Commands::Delete { id, yes }) => run_delete(&id, yes, host).await,
        Some(Commands::Copy { id }) => run_copy(&id, host).await,
        Some(Commands::Theme { command }) => run_theme(command, host),
        // Quick capture mode: jotin "my thought"
        None if note.is_empty() => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
        None => run_add(note, host).await,
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "jotin=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
