//! CSV row tokenizer.
//!
//! Splits a single line of comma-separated text into fields. A `"` toggles
//! the "inside quoted span" state and is never part of the field. Doubled
//! quotes are not unescaped and quoted fields cannot span lines.

/// Split one line into its fields.
///
/// Commas inside a quoted span do not end the field. Whitespace is kept as-is.
/// Malformed quoting never fails; it only moves the field boundaries.
pub fn tokenize_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}

/// Tokenize every non-empty line of `text`.
///
/// Lines are split on `\n` with a trailing `\r` stripped, so CRLF files
/// tokenize the same as LF files.
pub fn tokenize_lines(text: &str) -> Vec<Vec<String>> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(tokenize_row)
        .collect()
}
