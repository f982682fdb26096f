//! HTML rendering.
//!
//! Produces self-contained HTML files with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use dotpoint_core::progress::ProgressSummary;
use dotpoint_core::report::SyncReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

/// Render a progress card for one dotpoint.
pub fn progress_card_html(summary: &ProgressSummary) -> String {
    let mut html = String::new();
    page_head(
        &mut html,
        &format!("dotpoint progress: {}", summary.display_title()),
    );

    html.push_str("<section class=\"card\">\n");
    html.push_str(&format!(
        "<h1>{}</h1>\n<p class=\"meta\">{}</p>\n",
        html_escape(summary.display_title()),
        html_escape(&summary.dotpoint_id)
    ));

    html.push_str(&progress_bar(summary.overall_percent));

    html.push_str("<ul class=\"activities\">\n");
    for (label, done) in [
        ("Learn", summary.flags.learn),
        ("Quiz", summary.flags.quiz),
        ("Practice", summary.flags.practice),
    ] {
        let (class, mark) = if done { ("done", "&#10003;") } else { ("todo", "&#9675;") };
        html.push_str(&format!(
            "<li class=\"{class}\"><span class=\"mark\">{mark}</span> {label}</li>\n"
        ));
    }
    html.push_str("</ul>\n");

    html.push_str("<dl class=\"stats\">\n");
    html.push_str(&format!(
        "<dt>Sections completed</dt><dd>{}</dd>\n",
        summary.stats.sections_completed
    ));
    html.push_str(&format!("<dt>XP earned</dt><dd>{}</dd>\n", summary.stats.xp_earned));
    html.push_str("</dl>\n");
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn progress_bar(percent: u8) -> String {
    let max_width = 400;
    let bar_height = 24;
    let width = usize::from(percent.min(100)) * max_width / 100;

    let color = if percent >= 100 {
        "#22c55e"
    } else if percent >= 50 {
        "#eab308"
    } else {
        "#94a3b8"
    };

    format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"{percent}% complete\">\n\
         \x20 <rect x=\"0\" y=\"0\" width=\"{max_width}\" height=\"{bar_height}\" fill=\"var(--border)\" rx=\"4\"/>\n\
         \x20 <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{bar_height}\" fill=\"{color}\" rx=\"4\"/>\n\
         \x20 <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{percent}%</text>\n\
         </svg>\n",
        max_width + 50,
        bar_height,
        max_width + 8,
        bar_height / 2,
    )
}

/// Render a sync report as a table of per-file outcomes.
pub fn sync_report_html(report: &SyncReport) -> String {
    let mut html = String::new();
    page_head(&mut html, "dotpoint sync report");

    html.push_str("<header>\n<h1>dotpoint sync report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Backend: <strong>{}</strong> | mode {} | {} files | {} rows | {}</p>\n",
        html_escape(&report.backend),
        report.mode,
        report.files.len(),
        report.rows_written(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>File</th><th>Tab</th><th>Status</th><th>Rows</th><th>Range</th><th>Time</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for f in &report.files {
        let (class, status) = match (&f.error, f.tab_created) {
            (Some(e), _) => ("fail", format!("FAIL: {}", html_escape(e))),
            (None, true) => ("pass", "OK (tab created)".to_string()),
            (None, false) => ("pass", "OK".to_string()),
        };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}ms</td></tr>\n",
            html_escape(&f.path.display().to_string()),
            html_escape(&f.tab),
            status,
            f.rows_written,
            html_escape(f.range.as_deref().unwrap_or("-")),
            f.duration_ms,
        ));
    }
    html.push_str("</tbody></table>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write HTML to a file, creating parent directories.
pub fn write_html(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
.meta { color: #6b7280; }
.card { max-width: 32rem; border: 1px solid var(--border); border-radius: 8px; padding: 1.5rem; }
.activities { list-style: none; padding: 0; }
.activities li { padding: 0.25rem 0; }
.done .mark { color: #22c55e; }
.todo .mark { color: #94a3b8; }
.stats { display: grid; grid-template-columns: auto auto; gap: 0.25rem 1rem; }
.stats dd { margin: 0; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
"#;
