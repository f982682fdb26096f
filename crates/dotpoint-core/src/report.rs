//! Sync run report types with JSON persistence.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How rows are placed into a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Write every row, header included, starting at `A1`.
    ///
    /// Rows below the new data are left as they were, so a question removed
    /// from the CSV stays in the tab until cleared by hand.
    Overwrite,
    /// Skip the header and write after the tab's existing rows.
    Append,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Overwrite => write!(f, "overwrite"),
            SyncMode::Append => write!(f, "append"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" | "replace" => Ok(SyncMode::Overwrite),
            "append" | "merge" => Ok(SyncMode::Append),
            other => Err(format!("unknown sync mode: {other}")),
        }
    }
}

/// Result of syncing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Local CSV file.
    pub path: PathBuf,
    /// Target tab.
    pub tab: String,
    /// Whether the file was fully written.
    pub success: bool,
    /// Whether the tab had to be created.
    #[serde(default)]
    pub tab_created: bool,
    /// Rows sent to the spreadsheet.
    #[serde(default)]
    pub rows_written: usize,
    /// A1 range that was written, if anything was.
    #[serde(default)]
    pub range: Option<String>,
    /// Error text for failed files.
    #[serde(default)]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl FileOutcome {
    pub fn failed(path: &Path, tab: &str, error: &anyhow::Error, duration_ms: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            tab: tab.to_string(),
            success: false,
            tab_created: false,
            rows_written: 0,
            range: None,
            error: Some(format!("{error:#}")),
            duration_ms,
        }
    }
}

/// A complete sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Unique run identifier.
    pub id: Uuid,
    /// When the run started.
    pub created_at: DateTime<Utc>,
    /// Backend the rows were written to.
    pub backend: String,
    pub mode: SyncMode,
    /// Per-file outcomes, in processing order.
    pub files: Vec<FileOutcome>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.success).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn rows_written(&self) -> usize {
        self.files.iter().map(|f| f.rows_written).sum()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }
}
