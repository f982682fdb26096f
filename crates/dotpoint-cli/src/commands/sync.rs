//! The `dotpoint sync` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use dotpoint_core::engine::{SyncEngine, SyncJob, SyncReporter};
use dotpoint_core::report::{FileOutcome, SyncMode, SyncReport};
use dotpoint_report::html::{sync_report_html, write_html};
use dotpoint_sheets::config::{create_backend, load_config_from, DotpointConfig};

/// Console progress reporter.
struct ConsoleReporter;

impl SyncReporter for ConsoleReporter {
    fn on_file_start(&self, path: &Path, tab: &str) {
        eprintln!("  Syncing: {} -> {tab}", path.display());
    }

    fn on_file_complete(&self, outcome: &FileOutcome) {
        let created = if outcome.tab_created {
            " (tab created)"
        } else {
            ""
        };
        eprintln!(
            "  Done: {} -> {}{} [{} rows] ({}ms)",
            outcome.path.display(),
            outcome.tab,
            created,
            outcome.rows_written,
            outcome.duration_ms,
        );
    }

    fn on_file_error(&self, path: &Path, tab: &str, error: &str) {
        eprintln!("  ERROR: {} -> {tab}: {error}", path.display());
    }

    fn on_run_complete(&self, total: usize, succeeded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {succeeded}/{total} files synced, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

/// Jobs for the files named on the command line, or the configured files.
fn resolve_jobs(config: &DotpointConfig, files: &[PathBuf]) -> Vec<SyncJob> {
    if files.is_empty() {
        return config.jobs();
    }
    files
        .iter()
        .map(|path| match config.tab_for(path) {
            Some(tab) => SyncJob::new(path, tab),
            None => SyncJob::for_path(path),
        })
        .collect()
}

pub async fn execute(
    mode: SyncMode,
    config_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
    files: Vec<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let jobs = resolve_jobs(&config, &files);
    anyhow::ensure!(
        !jobs.is_empty(),
        "no files to sync: pass CSV paths or list [[files]] in dotpoint.toml"
    );

    let backend = create_backend(&config)?;
    let engine = SyncEngine::new(backend, mode);

    eprintln!(
        "dotpoint v{} — syncing {} file(s) in {mode} mode",
        env!("CARGO_PKG_VERSION"),
        jobs.len()
    );
    eprintln!();

    let report = engine.run(&jobs, &ConsoleReporter).await;

    print_summary(&report);

    if let Some(path) = &report_path {
        let is_html = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        if is_html {
            write_html(&sync_report_html(&report), path)?;
        } else {
            report.save_json(path)?;
        }
        eprintln!("Report saved to: {}", path.display());
    }

    anyhow::ensure!(
        report.failed() == 0,
        "{} of {} file(s) failed to sync",
        report.failed(),
        report.files.len()
    );

    Ok(())
}

fn print_summary(report: &SyncReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["File", "Tab", "Status", "Rows", "Range"]);

    for f in &report.files {
        let status = match (&f.error, f.tab_created) {
            (Some(_), _) => "FAIL",
            (None, true) => "OK (new tab)",
            (None, false) => "OK",
        };
        table.add_row(vec![
            Cell::new(f.path.display()),
            Cell::new(&f.tab),
            Cell::new(status),
            Cell::new(f.rows_written),
            Cell::new(f.range.as_deref().unwrap_or("-")),
        ]);
    }

    eprintln!("\n{table}");
}
