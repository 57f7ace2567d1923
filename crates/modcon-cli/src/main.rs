use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modcon_infrastructure::ModconPaths;
use modcon_telemetry::{LogOptions, init_logging};
use tokio::sync::mpsc;

mod commands;

#[derive(Parser)]
#[command(name = "modcon")]
#[command(about = "modcon - bulk moderation console for the dashboard API", long_about = None)]
struct Cli {
    /// Config file (defaults to $MODCON_CONFIG, then ~/.config/modcon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "modcon_application=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print console lifecycle events as JSON lines
    #[arg(long, global = true)]
    events: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List collections and their actions
    Collections,
    /// Fetch a collection and print its records with their indexes
    Show { collection: String },
    /// Run an action against selected records
    Run {
        collection: String,
        action: String,
        /// Record indexes, comma separated (e.g. 0,2)
        #[arg(long, value_delimiter = ',', required = true)]
        select: Vec<usize>,
        /// Deny reason (catalog key/name or free text)
        #[arg(long)]
        reason: Option<String>,
        /// Skip the confirmation prompt of destructive actions
        #[arg(long)]
        yes: bool,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let events = if cli.events {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(commands::utils::print_events(receiver));
        Some(sender)
    } else {
        None
    };
    let _log_guard = init_logging(LogOptions {
        level: cli.log_level.clone(),
        log_dir: ModconPaths::default().logs_dir().ok(),
        events,
    })?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Collections => commands::collections::list(),
        Commands::Show { collection } => commands::show::run(config_path, &collection).await?,
        Commands::Run {
            collection,
            action,
            select,
            reason,
            yes,
        } => {
            commands::run::run(
                config_path,
                commands::run::RunArgs {
                    collection,
                    action,
                    select,
                    reason,
                    yes,
                },
            )
            .await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(config_path)?,
            ConfigAction::Show => commands::config::show(config_path)?,
            ConfigAction::Init { force } => commands::config::init(config_path, force)?,
        },
    }

    Ok(())
}
