//! API key commands.

use crate::manager::KeysManager;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use api_key_collection::CollectionChange;
use api_key_types::{ApiKeyId, ApiKeyRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const LOAD_FAILED: &str = "Failed to load API keys from server";

/// One line of the key table.
#[derive(Debug, Serialize)]
struct KeyRow {
    id: String,
    name: String,
    identifier: String,
    status: &'static str,
    created_at: String,
    last_used_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl KeyRow {
    fn new(record: &ApiKeyRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name.clone(),
            identifier: record.identifier.clone(),
            status: record.status(now).as_str(),
            created_at: format_date(Some(record.created_at)),
            last_used_at: format_date(record.last_used_at),
            expires_at: record.expires_at.map(|at| format_date(Some(at))),
        }
    }
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "Never".to_string(),
    }
}

fn print_keys(records: &[ApiKeyRecord], format: &OutputFormat) -> Result<()> {
    let now = Utc::now();
    let rows: Vec<KeyRow> = records.iter().map(|record| KeyRow::new(record, now)).collect();

    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No API keys found");
                return Ok(());
            }
            println!(
                "{:<24} {:<24} {:<20} {:<8} {:<17} {}",
                "ID", "Name", "Key", "Status", "Created", "Last used"
            );
            println!("{}", "-".repeat(110));
            for row in &rows {
                println!(
                    "{:<24} {:<24} {:<20} {:<8} {:<17} {}",
                    row.id, row.name, row.identifier, row.status, row.created_at, row.last_used_at
                );
            }
        }
        OutputFormat::Json => output::print_json(&rows)?,
    }
    Ok(())
}

/// List keys after one refresh.
pub async fn keys_list(manager: &KeysManager, format: &OutputFormat) -> Result<()> {
    match manager.refresh().await {
        Ok(_) => print_keys(&manager.keys(), format),
        Err(error) => {
            debug!(%error, "Initial key load failed");
            anyhow::bail!("{LOAD_FAILED}: {error}")
        }
    }
}

/// Generate a key and show its secret once.
pub async fn keys_generate(
    manager: &KeysManager,
    name: &str,
    format: &OutputFormat,
) -> Result<()> {
    let outcome = manager.generate(name).await?;
    let generated = &outcome.value;

    match format {
        OutputFormat::Text => {
            output::print_heading("API key generated");
            output::print_row("ID", generated.id.as_str());
            output::print_row("Name", &generated.name);
            output::print_row("Key", &generated.key);
            println!();
            println!("Copy this key now. It will not be shown again.");
        }
        OutputFormat::Json => output::print_json(generated)?,
    }

    match outcome.refreshed {
        Ok(keys) => info!(count = keys.len(), "Key list refreshed after generate"),
        Err(error) => output::print_warning(&format!("{LOAD_FAILED}: {error}"), format),
    }
    Ok(())
}

/// Revoke a key.
pub async fn keys_revoke(manager: &KeysManager, id: &str, format: &OutputFormat) -> Result<()> {
    let id = ApiKeyId::from_string(id);
    let outcome = manager.revoke(&id).await?;

    output::print_success(&format!("API key {} revoked", id), format);
    if let Err(error) = outcome.refreshed {
        output::print_warning(&format!("{LOAD_FAILED}: {error}"), format);
    }
    Ok(())
}

/// Refresh on an interval and print every change to the collection.
///
/// Runs until interrupted, or for `cycles` refreshes when given.
pub async fn keys_watch(
    manager: &KeysManager,
    interval: Duration,
    cycles: Option<u64>,
    format: &OutputFormat,
) -> Result<()> {
    watch_until(manager, interval, cycles, format, tokio::signal::ctrl_c()).await
}

/// The watch loop. Ends as soon as `shutdown` completes, including while a
/// refresh is still in flight.
async fn watch_until<F: Future>(
    manager: &KeysManager,
    interval: Duration,
    cycles: Option<u64>,
    format: &OutputFormat,
    shutdown: F,
) -> Result<()> {
    tokio::pin!(shutdown);
    let subscription = manager.subscribe();
    let mut ticker = tokio::time::interval(interval);
    let mut completed = 0u64;

    if *format == OutputFormat::Text {
        println!("Watching API keys every {}s (Ctrl-C to stop)", interval.as_secs());
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                debug!("Watch interrupted");
                break;
            }
        }

        let refreshed = tokio::select! {
            refreshed = manager.refresh() => refreshed,
            _ = &mut shutdown => {
                debug!("Watch interrupted during refresh");
                break;
            }
        };
        if let Err(error) = refreshed {
            output::print_error(&format!("{LOAD_FAILED}: {error}"), format);
        }

        for change in subscription.drain() {
            print_change(&change, manager, format)?;
        }

        completed += 1;
        if cycles.is_some_and(|limit| completed >= limit) {
            break;
        }
    }

    Ok(())
}

fn print_change(
    change: &CollectionChange,
    manager: &KeysManager,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&change_json(change)),
        OutputFormat::Text => {
            match change {
                CollectionChange::Inserted(record) => println!("+ {} ({})", record.name, record.id),
                CollectionChange::Deleted(id) => println!("- {}", id),
                CollectionChange::Replaced { keys } => {
                    println!("{} key(s) at {}", keys.len(), Utc::now().format("%H:%M:%S"));
                    print_keys(&manager.keys(), format)?;
                }
            }
            Ok(())
        }
    }
}

fn change_json(change: &CollectionChange) -> serde_json::Value {
    match change {
        CollectionChange::Inserted(record) => {
            serde_json::json!({"change": "inserted", "key": record})
        }
        CollectionChange::Deleted(id) => serde_json::json!({"change": "deleted", "id": id}),
        CollectionChange::Replaced { keys } => {
            serde_json::json!({"change": "replaced", "ids": keys})
        }
    }
}
