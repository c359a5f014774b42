//! Backup listing and restore commands.

use crate::commands::inspect::format_size;
use crate::Format;
use healthguard_core::{BackupEntry, Collection, Config, Registry};
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use tracing::info;

/// One snapshot as reported by `backups`.
#[derive(Debug, Serialize)]
struct BackupReport<'a> {
    file: &'a str,
    created_at: Option<String>,
    size: u64,
}

impl<'a> From<&'a BackupEntry> for BackupReport<'a> {
    fn from(entry: &'a BackupEntry) -> Self {
        Self {
            file: &entry.file_name,
            created_at: entry
                .created_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string()),
            size: entry.size,
        }
    }
}

/// Lists the snapshots of `collection`, oldest first.
pub fn list(
    config: Config,
    collection: &str,
    format: Format,
) -> Result<(), Box<dyn Error>> {
    let entries = backups(config, collection)?;
    let reports: Vec<BackupReport<'_>> = entries.iter().map(BackupReport::from).collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => {
            if reports.is_empty() {
                println!("No backups for {collection}.");
            }
            for report in &reports {
                println!(
                    "{}  {:>9}  {}",
                    report.file,
                    format_size(report.size),
                    report.created_at.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

/// Rolls `collection` back to its newest snapshot.
pub fn restore(config: Config, collection: &str) -> Result<(), Box<dyn Error>> {
    info!(collection, "restoring from newest backup");

    let restored = restore_collection(config, collection)?;

    println!("✓ Restored {collection}");
    println!("  Records: {restored}");

    Ok(())
}

/// Returns the snapshots of an existing collection, oldest first.
pub fn backups(config: Config, collection: &str) -> Result<Vec<BackupEntry>, Box<dyn Error>> {
    let registry = Registry::open(config.create_if_missing(false))?;
    Ok(existing(&registry, collection)?.list_backups()?)
}

/// Restores an existing collection and returns its record count.
pub fn restore_collection(config: Config, collection: &str) -> Result<usize, Box<dyn Error>> {
    let registry = Registry::open(config.create_if_missing(false))?;
    Ok(existing(&registry, collection)?.restore_latest_backup()?)
}

/// Opens `name` only if it already has a durable unit, so a typo never
/// leaves an empty collection behind.
fn existing(registry: &Registry, name: &str) -> Result<Arc<Collection>, Box<dyn Error>> {
    if !registry.discover()?.iter().any(|known| known == name) {
        return Err(format!("unknown collection: {name}").into());
    }
    Ok(registry.collection(name)?)
}
