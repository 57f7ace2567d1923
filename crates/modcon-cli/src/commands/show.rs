use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use modcon_core::collection::CollectionId;
use modcon_core::notification::Notice;
use tokio::sync::mpsc::UnboundedReceiver;

use super::utils;

/// Fetches `collection` and prints its records with their selection indexes.
pub async fn run(config_path: Option<&Path>, collection: &str) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let (console, notices) = utils::build_console(&config)?;

    console
        .switch_collection(&CollectionId::new(collection))
        .await
        .with_context(|| format!("Unknown collection '{collection}'"))?;
    flush_notices(notices);

    let snapshot = console.snapshot();
    println!(
        "{} ({} records)",
        snapshot.title.unwrap_or(collection).bold(),
        snapshot.records.len()
    );
    for (index, record) in snapshot.records.iter().enumerate() {
        let id = record.id().unwrap_or_else(|| "-".to_string());
        let body = serde_json::to_string(record).unwrap_or_default();
        println!("{:>4}  {}  {}", index.to_string().cyan(), id.bold(), body.dimmed());
    }
    Ok(())
}

fn flush_notices(mut notices: UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        utils::print_notice(&notice);
    }
}
