//! dotpoint-report: rendering of progress summaries and sync reports.

pub mod html;
pub mod text;

pub use html::{progress_card_html, sync_report_html, write_html};
pub use text::progress_text;
