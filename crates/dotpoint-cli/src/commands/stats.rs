//! The `dotpoint stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use dotpoint_core::progress::{CompletionFlags, ProgressSummary};
use dotpoint_core::store::JsonFileStore;
use dotpoint_report::{progress_card_html, progress_text};

use crate::StatsFormat;

pub fn execute(
    store_path: PathBuf,
    dotpoint_id: String,
    flags: CompletionFlags,
    title: Option<String>,
    format: StatsFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut store = JsonFileStore::open(&store_path)
        .with_context(|| format!("failed to open progress store {}", store_path.display()))?;
    let summary = ProgressSummary::load(&mut store, &dotpoint_id, title, flags);

    let rendered = match format {
        StatsFormat::Text => progress_text(&summary),
        StatsFormat::Json => serde_json::to_string_pretty(&summary)?,
        StatsFormat::Html => progress_card_html(&summary),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
