use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use modcon_application::ModerationConsole;
use modcon_core::collection::default_registry;
use modcon_core::config::ConsoleConfig;
use modcon_core::notification::{Notice, NoticeLevel, Notifier};
use modcon_infrastructure::{ConfigService, HttpDashboardClient};
use modcon_telemetry::ConsoleEvent;
use tokio::sync::mpsc;

/// Config service for `--config`, or the default location.
pub fn config_service(path: Option<&Path>) -> Result<ConfigService> {
    match path {
        Some(path) => Ok(ConfigService::with_path(path)),
        None => ConfigService::new().context("Failed to resolve config path"),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig> {
    let service = config_service(path)?;
    service
        .get_config()
        .with_context(|| format!("Failed to load {}", service.config_path().display()))
}

/// Builds a console talking to the configured API.
pub fn build_console(
    config: &ConsoleConfig,
) -> Result<(ModerationConsole, mpsc::UnboundedReceiver<Notice>)> {
    let client = Arc::new(
        HttpDashboardClient::new(&config.api).context("Failed to build HTTP client")?,
    );
    let (notifier, notices) = Notifier::channel();
    let console = ModerationConsole::new(
        Arc::new(default_registry().clone()),
        client.clone(),
        client,
        config,
        notifier,
    );
    Ok((console, notices))
}

/// Prints notices until every sender is gone.
pub async fn print_notices(mut notices: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        print_notice(&notice);
    }
}

pub fn print_notice(notice: &Notice) {
    let context = notice
        .context
        .as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default();
    let line = format!("{}{}", notice.message, context);
    match notice.level {
        NoticeLevel::Error => eprintln!("{}", format!("✗ {line}").red()),
        NoticeLevel::Warning => eprintln!("{}", format!("! {line}").yellow()),
        NoticeLevel::Success => println!("{}", format!("✓ {line}").green()),
        NoticeLevel::Info => println!("{}", format!("  {line}").cyan()),
    }
}

pub async fn print_events(mut events: mpsc::UnboundedReceiver<ConsoleEvent>) {
    while let Some(event) = events.recv().await {
        if let Ok(line) = serde_json::to_string(&event) {
            println!("{line}");
        }
    }
}

/// Reads one trimmed line from stdin after printing `question`.
pub fn prompt_line(question: &str) -> Result<String> {
    print!("{} ", question.bold());
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
