//! Thumbdash CLI - manage dashboard API keys from the terminal.

mod commands;
mod manager;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dashboard_config_and_utils::{init_logging, Config, Paths};
use manager::KeysManager;
use std::time::Duration;
use tracing::{debug, warn};

/// Thumbdash CLI - List, generate and revoke API keys.
#[derive(Parser)]
#[command(name = "thumbdash")]
#[command(about = "Thumbdash CLI for API key management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Mirror logs to stderr at the chosen level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Access token sent as a bearer credential
    #[arg(long, env = "THUMBDASH_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// API root, overriding the config file and THUMBDASH_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage API keys
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// List API keys
    List,
    /// Generate a new API key
    Generate {
        /// Display name for the key
        name: String,
    },
    /// Revoke an API key
    Revoke {
        /// Key ID
        id: String,
    },
    /// Refresh periodically and print changes
    Watch {
        /// Seconds between refreshes
        #[arg(
            short,
            long,
            default_value = "30",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval_secs: u64,
        /// Stop after this many refreshes
        #[arg(long)]
        cycles: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

/// Apply command-line overrides, then validate the effective config.
fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(api_url) = &cli.api_url {
        config.api_base_url = api_url.clone();
    }
    config.validate()?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let paths = Paths::new()?;
    let (mut config, ignored_env) = Config::load(&paths)?;
    apply_overrides(&cli, &mut config)?;

    let logging = init_logging(&paths, &config.log_level, cli.verbose);
    if let Err(e) = &logging {
        output::print_warning(&format!("Logging disabled: {}", e), &cli.format);
    }
    for message in &ignored_env {
        if logging.is_ok() {
            warn!("{message}");
        } else {
            output::print_warning(message, &cli.format);
        }
    }
    debug!(config = ?config, "Configuration loaded");

    let format = cli.format;
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&config, &paths, &format),
        },
        Commands::Keys { command } => {
            let manager = KeysManager::from_config(&config, cli.token)?;
            match command {
                KeyCommands::List => commands::keys_list(&manager, &format).await,
                KeyCommands::Generate { name } => {
                    commands::keys_generate(&manager, &name, &format).await
                }
                KeyCommands::Revoke { id } => commands::keys_revoke(&manager, &id, &format).await,
                KeyCommands::Watch {
                    interval_secs,
                    cycles,
                } => {
                    commands::keys_watch(
                        &manager,
                        Duration::from_secs(interval_secs),
                        cycles,
                        &format,
                    )
                    .await
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
