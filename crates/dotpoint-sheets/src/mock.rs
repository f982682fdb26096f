//! In-memory spreadsheet for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use dotpoint_core::traits::{a1_range, SpreadsheetBackend};

/// A spreadsheet held in memory, for exercising the sync engine without
/// network access.
///
/// Tabs can be pre-seeded, and individual tabs can be made to fail writes.
pub struct MockSpreadsheet {
    tabs: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
    failing_tabs: Vec<String>,
    write_count: AtomicU32,
    create_count: AtomicU32,
}

impl MockSpreadsheet {
    pub fn new() -> Self {
        Self {
            tabs: Mutex::new(BTreeMap::new()),
            failing_tabs: Vec::new(),
            write_count: AtomicU32::new(0),
            create_count: AtomicU32::new(0),
        }
    }

    /// Seed a tab with existing rows.
    pub fn with_tab(self, title: &str, rows: Vec<Vec<String>>) -> Self {
        self.lock().insert(title.to_string(), rows);
        self
    }

    /// Make every write to `title` fail.
    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing_tabs.push(title.to_string());
        self
    }

    /// Current rows of a tab.
    pub fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.lock().get(title).cloned()
    }

    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn create_count(&self) -> u32 {
        self.create_count.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Vec<String>>>> {
        // A poisoned lock only means another test thread panicked.
        self.tabs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockSpreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpreadsheetBackend for MockSpreadsheet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_tabs(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn create_tab(&self, title: &str) -> anyhow::Result<()> {
        self.create_count.fetch_add(1, Ordering::Relaxed);
        let mut tabs = self.lock();
        if tabs.contains_key(title) {
            anyhow::bail!("a sheet with the name \"{title}\" already exists");
        }
        tabs.insert(title.to_string(), Vec::new());
        Ok(())
    }

    async fn read_values(&self, tab: &str) -> anyhow::Result<Vec<Vec<String>>> {
        self.lock()
            .get(tab)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unable to parse range: {tab}"))
    }

    async fn write_values(
        &self,
        tab: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> anyhow::Result<String> {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        if self.failing_tabs.iter().any(|t| t == tab) {
            anyhow::bail!("simulated write failure for tab '{tab}'");
        }
        anyhow::ensure!(start_row >= 1, "rows are 1-based");

        let mut tabs = self.lock();
        let Some(values) = tabs.get_mut(tab) else {
            anyhow::bail!("unable to parse range: {tab}");
        };

        let offset = start_row - 1;
        if values.len() < offset {
            values.resize(offset, Vec::new());
        }
        for (i, row) in rows.iter().enumerate() {
            match values.get_mut(offset + i) {
                Some(existing) => *existing = row.clone(),
                None => values.push(row.clone()),
            }
        }

        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(a1_range(tab, start_row, rows.len(), cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn create_then_write() {
        let sheet = MockSpreadsheet::new();
        sheet.create_tab("Module 5").await.unwrap();
        let range = sheet
            .write_values("Module 5", 1, &[row(&["q", "a"]), row(&["Q1", "A1"])])
            .await
            .unwrap();

        assert_eq!(range, "'Module 5'!A1:B2");
        assert_eq!(sheet.rows("Module 5").unwrap().len(), 2);
        assert_eq!(sheet.create_count(), 1);
        assert_eq!(sheet.write_count(), 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_only_covered_rows() {
        let sheet = MockSpreadsheet::new().with_tab(
            "M5",
            vec![row(&["h"]), row(&["old1"]), row(&["old2"])],
        );
        sheet.write_values("M5", 1, &[row(&["h"]), row(&["new1"])]).await.unwrap();

        let rows = sheet.rows("M5").unwrap();
        assert_eq!(rows[1], row(&["new1"]));
        assert_eq!(rows[2], row(&["old2"]));
    }

    #[tokio::test]
    async fn duplicate_tab_is_rejected() {
        let sheet = MockSpreadsheet::new().with_tab("M5", vec![]);
        assert!(sheet.create_tab("M5").await.is_err());
    }

    #[tokio::test]
    async fn failing_tab_errors() {
        let sheet = MockSpreadsheet::new().with_tab("M5", vec![]).failing_on("M5");
        let err = sheet.write_values("M5", 1, &[row(&["x"])]).await.unwrap_err();
        assert!(err.to_string().contains("simulated write failure"));
    }
}
