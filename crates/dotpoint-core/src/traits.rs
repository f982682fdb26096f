//! Core trait definitions for spreadsheet backends.
//!
//! Implemented by the `dotpoint-sheets` crate (Google Sheets and an in-memory
//! mock) and driven by the [`SyncEngine`](crate::engine::SyncEngine).

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Spreadsheet backend trait
// ---------------------------------------------------------------------------

/// A remote spreadsheet made of named tabs of string cells.
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Human-readable backend name (e.g. "google-sheets").
    fn name(&self) -> &str;

    /// Titles of every tab in the spreadsheet.
    async fn list_tabs(&self) -> anyhow::Result<Vec<String>>;

    /// Create an empty tab.
    async fn create_tab(&self, title: &str) -> anyhow::Result<()>;

    /// All non-empty rows of a tab, starting at row 1.
    async fn read_values(&self, tab: &str) -> anyhow::Result<Vec<Vec<String>>>;

    /// Write `rows` into `tab` starting at the 1-based `start_row`, column A.
    ///
    /// Returns the A1 range that was written.
    async fn write_values(
        &self,
        tab: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// A1 notation helpers
// ---------------------------------------------------------------------------

/// Quote a tab title for use in A1 notation (`'It''s'`).
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// A1 reference to the first cell of `row` in `tab`.
pub fn a1_start(tab: &str, row: usize) -> String {
    format!("{}!A{}", quote_tab(tab), row)
}

/// A1 range covering `rows` x `cols` cells starting at `start_row`.
pub fn a1_range(tab: &str, start_row: usize, rows: usize, cols: usize) -> String {
    if rows == 0 || cols == 0 {
        return a1_start(tab, start_row);
    }
    format!(
        "{}!A{}:{}{}",
        quote_tab(tab),
        start_row,
        column_letters(cols),
        start_row + rows - 1
    )
}

/// Spreadsheet column letters for a 1-based column index (1 → A, 27 → AA).
pub fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_wrap() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(14), "N");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn tab_quotes_are_doubled() {
        assert_eq!(quote_tab("Newton's Laws"), "'Newton''s Laws'");
        assert_eq!(a1_start("Module 5", 1), "'Module 5'!A1");
    }

    #[test]
    fn range_spans_rows_and_columns() {
        assert_eq!(a1_range("M5", 4, 3, 14), "'M5'!A4:N6");
        assert_eq!(a1_range("M5", 4, 0, 14), "'M5'!A4");
    }
}
