//! The `dotpoint migrate-progress` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use dotpoint_core::progress::migrate_legacy_keys;
use dotpoint_core::store::JsonFileStore;

pub fn execute(store_path: PathBuf) -> Result<()> {
    let mut store = JsonFileStore::open(&store_path)
        .with_context(|| format!("failed to open progress store {}", store_path.display()))?;
    let summary = migrate_legacy_keys(&mut store)?;

    for id in &summary.migrated {
        println!("  migrated: {id}");
    }
    for id in &summary.dropped {
        println!("  dropped legacy duplicate: {id}");
    }
    println!(
        "{} key(s) migrated, {} legacy duplicate(s) dropped.",
        summary.migrated.len(),
        summary.dropped.len()
    );

    Ok(())
}
