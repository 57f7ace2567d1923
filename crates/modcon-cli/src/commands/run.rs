use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use modcon_application::{BatchReport, ReasonPrompt, TriggerOutcome};
use modcon_core::collection::CollectionId;
use modcon_core::error::ModconError;

use super::utils;

pub struct RunArgs {
    pub collection: String,
    pub action: String,
    pub select: Vec<usize>,
    pub reason: Option<String>,
    pub yes: bool,
}

/// Drives one action through reason capture and confirmation to completion.
pub async fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let (console, notices) = utils::build_console(&config)?;
    let printer = tokio::spawn(utils::print_notices(notices));

    console
        .switch_collection(&CollectionId::new(&args.collection))
        .await?;
    console
        .select(args.select.iter().copied())
        .context("Invalid --select")?;

    let mut outcome = console
        .trigger(&args.action, args.reason.as_deref())
        .await?;
    loop {
        outcome = match outcome {
            TriggerOutcome::Navigate(target) => {
                println!("→ {target}");
                break;
            }
            TriggerOutcome::ReasonRequired(prompt) => {
                print_reason_prompt(&prompt);
                loop {
                    let input = utils::prompt_line("Reason:")?;
                    match console.submit_reason(&input).await {
                        Ok(next) => break next,
                        Err(e @ (ModconError::InvalidReason(_) | ModconError::ReasonRequired(_))) => {
                            eprintln!("{}", e.to_string().yellow());
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            TriggerOutcome::ConfirmationRequired(prompt) => {
                println!("{}", prompt.message.yellow());
                if args.yes || utils::confirm("Proceed?")? {
                    console.confirm().await?
                } else {
                    console.cancel();
                    println!("Cancelled, nothing was sent.");
                    break;
                }
            }
            TriggerOutcome::Completed(report) => {
                print_report(&report);
                break;
            }
        };
    }

    // Fired requests keep a notifier clone until they settle; once the console
    // is gone the printer ends with the last of them.
    drop(console);
    let grace = Duration::from_secs(config.api.timeout_secs.saturating_add(1));
    if tokio::time::timeout(grace, printer).await.is_err() {
        tracing::warn!("[Cli] Some requests were still in flight at exit");
    }
    Ok(())
}

fn print_reason_prompt(prompt: &ReasonPrompt) {
    println!("{}", prompt.description.bold());
    if let Some(catalog) = &prompt.catalog {
        for reason in catalog {
            println!(
                "  {} {} {}",
                reason.key.cyan(),
                reason.name,
                reason.description.dimmed()
            );
        }
    }
}

fn print_report(report: &BatchReport) {
    let summary = format!(
        "{} on {}: {}/{} dispatched",
        report.action, report.collection, report.dispatched, report.targets
    );
    if report.failures.is_empty() {
        println!("{}", format!("✓ {summary}").green());
    } else {
        println!("{}", format!("! {summary}, {} failed", report.failures.len()).yellow());
        for failure in &report.failures {
            println!(
                "  #{} {}: {}",
                failure.index,
                failure.target.as_deref().unwrap_or("-"),
                failure.error
            );
        }
        if report.failures.iter().any(|f| f.error.is_rate_limited()) {
            println!(
                "{}",
                "The API rate limited this batch; raise request_delay_ms and retry.".yellow()
            );
        }
    }
    if !report.refreshed {
        println!("{}", "Data could not be refreshed; records may be stale.".yellow());
    }
}
