//! Sync engine: pushes local question banks into spreadsheet tabs.
//!
//! Files are processed one after another. A failure in one file is reported
//! and the run moves on to the next file; nothing is retried or rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::bank::{default_tab_for, load_bank};
use crate::report::{FileOutcome, SyncMode, SyncReport};
use crate::traits::SpreadsheetBackend;

/// One local file and the tab it is synced into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub path: PathBuf,
    pub tab: String,
}

impl SyncJob {
    pub fn new(path: impl Into<PathBuf>, tab: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tab: tab.into(),
        }
    }

    /// Job targeting the tab named after the file stem.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tab = default_tab_for(&path);
        Self { path, tab }
    }
}

/// Progress reporting trait.
pub trait SyncReporter: Send + Sync {
    fn on_file_start(&self, path: &Path, tab: &str);
    fn on_file_complete(&self, outcome: &FileOutcome);
    fn on_file_error(&self, path: &Path, tab: &str, error: &str);
    fn on_run_complete(&self, total: usize, succeeded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl SyncReporter for NoopReporter {
    fn on_file_start(&self, _: &Path, _: &str) {}
    fn on_file_complete(&self, _: &FileOutcome) {}
    fn on_file_error(&self, _: &Path, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The sync engine.
pub struct SyncEngine {
    backend: Arc<dyn SpreadsheetBackend>,
    mode: SyncMode,
}

impl SyncEngine {
    pub fn new(backend: Arc<dyn SpreadsheetBackend>, mode: SyncMode) -> Self {
        Self { backend, mode }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Sync every job in order and collect the outcomes.
    pub async fn run(&self, jobs: &[SyncJob], progress: &dyn SyncReporter) -> SyncReport {
        let start = Instant::now();
        let created_at = Utc::now();
        let mut files = Vec::with_capacity(jobs.len());

        for job in jobs {
            progress.on_file_start(&job.path, &job.tab);
            let file_start = Instant::now();

            let outcome = match self.sync_file(job).await {
                Ok(mut outcome) => {
                    outcome.duration_ms = file_start.elapsed().as_millis() as u64;
                    progress.on_file_complete(&outcome);
                    outcome
                }
                Err(e) => {
                    tracing::warn!("sync of {} failed: {:#}", job.path.display(), e);
                    progress.on_file_error(&job.path, &job.tab, &format!("{e:#}"));
                    FileOutcome::failed(
                        &job.path,
                        &job.tab,
                        &e,
                        file_start.elapsed().as_millis() as u64,
                    )
                }
            };
            files.push(outcome);
        }

        let report = SyncReport {
            id: Uuid::new_v4(),
            created_at,
            backend: self.backend.name().to_string(),
            mode: self.mode,
            files,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        progress.on_run_complete(
            report.files.len(),
            report.succeeded(),
            report.failed(),
            start.elapsed(),
        );

        report
    }

    /// Sync a single file: read, tokenize, ensure the tab, write.
    pub async fn sync_file(&self, job: &SyncJob) -> Result<FileOutcome> {
        let bank = load_bank(&job.path)?;
        let rows = match self.mode {
            SyncMode::Overwrite => bank.all_rows(),
            SyncMode::Append => bank.rows,
        };

        let tabs = self.backend.list_tabs().await?;
        let tab_created = !tabs.iter().any(|t| t == &job.tab);
        if tab_created {
            tracing::info!("creating tab '{}'", job.tab);
            self.backend.create_tab(&job.tab).await?;
        }

        let start_row = match self.mode {
            SyncMode::Overwrite => 1,
            SyncMode::Append if tab_created => 1,
            SyncMode::Append => self.backend.read_values(&job.tab).await?.len() + 1,
        };

        let range = if rows.is_empty() {
            tracing::info!("{} has no rows to write", job.path.display());
            None
        } else {
            Some(
                self.backend
                    .write_values(&job.tab, start_row, &rows)
                    .await?,
            )
        };

        Ok(FileOutcome {
            path: job.path.clone(),
            tab: job.tab.clone(),
            success: true,
            tab_created,
            rows_written: rows.len(),
            range,
            error: None,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::traits::a1_start;

    /// Backend recording every write.
    #[derive(Default)]
    struct RecordingBackend {
        tabs: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
        writes: Mutex<Vec<(String, usize, usize)>>,
    }

    #[async_trait]
    impl SpreadsheetBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn list_tabs(&self) -> Result<Vec<String>> {
            Ok(self.tabs.lock().unwrap().keys().cloned().collect())
        }

        async fn create_tab(&self, title: &str) -> Result<()> {
            self.tabs.lock().unwrap().insert(title.into(), vec![]);
            Ok(())
        }

        async fn read_values(&self, tab: &str) -> Result<Vec<Vec<String>>> {
            Ok(self.tabs.lock().unwrap().get(tab).cloned().unwrap_or_default())
        }

        async fn write_values(
            &self,
            tab: &str,
            start_row: usize,
            rows: &[Vec<String>],
        ) -> Result<String> {
            if rows.iter().any(|r| r.len() == 1 && r[0].is_empty()) {
                anyhow::bail!("empty row reached the backend");
            }
            let mut tabs = self.tabs.lock().unwrap();
            let values = tabs.entry(tab.into()).or_default();
            values.truncate(start_row - 1);
            values.extend(rows.iter().cloned());
            self.writes
                .lock()
                .unwrap()
                .push((tab.into(), start_row, rows.len()));
            Ok(a1_start(tab, start_row))
        }
    }

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn overwrite_includes_header_from_row_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "m5.csv", "q,a\n\nQ1,A1\nQ2,A2\n");
        let backend = Arc::new(RecordingBackend::default());
        let engine = SyncEngine::new(backend.clone(), SyncMode::Overwrite);

        let report = engine.run(&[SyncJob::for_path(&path)], &NoopReporter).await;

        assert_eq!(report.succeeded(), 1);
        assert!(report.files[0].tab_created);
        assert_eq!(report.files[0].rows_written, 3);
        assert_eq!(*backend.writes.lock().unwrap(), vec![("m5".to_string(), 1, 3)]);
        assert_eq!(backend.tabs.lock().unwrap()["m5"][0], vec!["q", "a"]);
    }

    #[tokio::test]
    async fn append_skips_header_and_starts_after_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "m5.csv", "q,a\nQ3,A3\n");
        let backend = Arc::new(RecordingBackend::default());
        backend.tabs.lock().unwrap().insert(
            "Module 5".into(),
            vec![
                vec!["q".into(), "a".into()],
                vec!["Q1".into(), "A1".into()],
            ],
        );
        let engine = SyncEngine::new(backend.clone(), SyncMode::Append);

        let report = engine
            .run(&[SyncJob::new(&path, "Module 5")], &NoopReporter)
            .await;

        assert_eq!(report.succeeded(), 1);
        assert!(!report.files[0].tab_created);
        assert_eq!(report.files[0].range.as_deref(), Some("'Module 5'!A3"));
        let tabs = backend.tabs.lock().unwrap();
        assert_eq!(tabs["Module 5"].len(), 3);
        assert_eq!(tabs["Module 5"][2], vec!["Q3", "A3"]);
    }

    #[tokio::test]
    async fn missing_file_fails_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_csv(dir.path(), "good.csv", "q,a\nQ1,A1\n");
        let backend = Arc::new(RecordingBackend::default());
        let engine = SyncEngine::new(backend.clone(), SyncMode::Overwrite);

        let jobs = [
            SyncJob::for_path(dir.path().join("missing.csv")),
            SyncJob::for_path(&good),
        ];
        let report = engine.run(&jobs, &NoopReporter).await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert!(report.files[0]
            .error
            .as_deref()
            .unwrap()
            .contains("failed to read question bank"));
        assert!(backend.tabs.lock().unwrap().contains_key("good"));
    }

    #[tokio::test]
    async fn header_only_file_in_append_mode_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "empty.csv", "q,a\n\n");
        let backend = Arc::new(RecordingBackend::default());
        let engine = SyncEngine::new(backend.clone(), SyncMode::Append);

        let report = engine.run(&[SyncJob::for_path(&path)], &NoopReporter).await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.files[0].rows_written, 0);
        assert!(report.files[0].range.is_none());
        assert!(backend.writes.lock().unwrap().is_empty());
    }
}
