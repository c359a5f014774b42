//! Inspect command implementation.

use crate::Format;
use healthguard_core::{Config, CoreResult, Registry};
use serde::Serialize;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Snapshot directory path.
    pub backup_dir: String,
    /// Total size of all collection files in bytes.
    pub total_size: u64,
    /// Per-collection details, sorted by name.
    pub collections: Vec<CollectionReport>,
}

/// Details for a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionReport {
    /// Collection name.
    pub name: String,
    /// Number of stored documents.
    pub records: usize,
    /// Last assigned identifier.
    pub counter: u64,
    /// File size in bytes.
    pub size: u64,
    /// Number of retained snapshots.
    pub backups: usize,
}

/// Runs the inspect command.
pub fn run(config: Config, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(config.create_if_missing(false))?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }

    Ok(())
}

/// Gathers the report without printing it.
pub fn inspect(config: Config) -> CoreResult<InspectResult> {
    let backup_dir = config.resolved_backup_dir().display().to_string();
    let registry = Registry::open(config)?;

    let mut collections = Vec::new();
    for name in registry.discover()? {
        let collection = registry.collection(&name)?;
        let summary = collection.summary()?;
        collections.push(CollectionReport {
            name: summary.name,
            records: summary.records,
            counter: summary.counter,
            size: summary.size_bytes,
            backups: collection.list_backups()?.len(),
        });
    }

    Ok(InspectResult {
        path: registry.config().data_dir.display().to_string(),
        backup_dir,
        total_size: collections.iter().map(|c| c.size).sum(),
        collections,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("HealthGuard Data Directory");
    println!("==========================");
    println!();
    println!("Path:    {}", result.path);
    println!("Backups: {}", result.backup_dir);
    println!("Size:    {}", format_size(result.total_size));
    println!();

    if result.collections.is_empty() {
        println!("No collections.");
        return;
    }

    let width = result
        .collections
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);

    println!("Collections:");
    for col in &result.collections {
        println!(
            "  {:<width$}  {:>6} records  counter {:>6}  {:>9}  {} backups",
            col.name,
            col.records,
            col.counter,
            format_size(col.size),
            col.backups,
        );
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthguard_core::into_document;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn reports_existing_collections() {
        let temp = tempdir().unwrap();
        let config = Config::with_data_dir(temp.path()).sync_on_write(false);
        {
            let registry = Registry::open(config.clone()).unwrap();
            let users = registry.collection("users").unwrap();
            users.create(into_document(json!({"username": "a"})).unwrap()).unwrap();
            users.create(into_document(json!({"username": "b"})).unwrap()).unwrap();
            registry.collection("clinics").unwrap();
        }

        let result = inspect(config.create_if_missing(false)).unwrap();
        let names: Vec<_> = result.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["clinics", "users"]);

        let users = &result.collections[1];
        assert_eq!(users.records, 2);
        assert_eq!(users.counter, 2);
        assert_eq!(users.backups, 2);
        assert!(result.total_size >= users.size);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().unwrap();
        let config = Config::with_data_dir(temp.path().join("absent")).create_if_missing(false);
        assert!(inspect(config).is_err());
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
