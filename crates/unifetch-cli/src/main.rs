//! Command line front end for unifetch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use unifetch::HttpClient;

mod output;
mod settings;
mod sub_commands;

/// Send HTTP requests through a selectable transport
#[derive(Debug, Parser)]
#[command(name = "unifetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "error")]
    log_level: Level,
    #[command(flatten)]
    overrides: settings::Overrides,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a GET request
    Get(sub_commands::RequestSubCommand),
    /// Send a POST request
    Post(sub_commands::BodyRequestSubCommand),
    /// Send a PUT request
    Put(sub_commands::BodyRequestSubCommand),
    /// Send a DELETE request
    Delete(sub_commands::RequestSubCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    let default_filter = args.log_level;
    let hyper_filter = "hyper=warn,hyper_util=warn";

    let env_filter = EnvFilter::new(format!("{},{}", default_filter, hyper_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let options = settings::Settings::new(args.config).load(args.overrides.into_options()?)?;
    let client = HttpClient::new(options);

    let body = match &args.command {
        Commands::Get(sub_command_args) => sub_commands::get(&client, sub_command_args).await?,
        Commands::Post(sub_command_args) => {
            sub_commands::post(&client, sub_command_args).await?
        }
        Commands::Put(sub_command_args) => sub_commands::put(&client, sub_command_args).await?,
        Commands::Delete(sub_command_args) => {
            sub_commands::delete(&client, sub_command_args).await?
        }
    };

    println!("{}", output::render(&body)?);

    Ok(())
}
