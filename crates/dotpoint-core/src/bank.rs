//! Question bank CSV loading and validation.
//!
//! A bank is a CSV file whose first non-empty line is the header. Blank lines
//! are dropped before tokenizing so they never become rows.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{Question, QUESTION_COLUMNS};
use crate::tokenizer::tokenize_lines;

/// A tokenized question bank file.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    /// File the bank was read from.
    pub source: PathBuf,
    /// Header row. Empty when the file had no non-empty lines.
    pub header: Vec<String>,
    /// Data rows, header excluded.
    pub rows: Vec<Vec<String>>,
}

impl QuestionBank {
    /// Every row including the header, as written in overwrite mode.
    pub fn all_rows(&self) -> Vec<Vec<String>> {
        if self.header.is_empty() {
            return self.rows.clone();
        }
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Interpret every data row as a [`Question`].
    pub fn questions(&self) -> Vec<Question> {
        self.rows
            .iter()
            .map(|row| Question::from_row(&self.header, row))
            .collect()
    }

    /// Tab name derived from the file stem.
    pub fn default_tab(&self) -> String {
        default_tab_for(&self.source)
    }
}

/// Tab name for a CSV path: the file stem.
pub fn default_tab_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read and tokenize a question bank file.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;
    Ok(parse_bank_str(&content, path))
}

/// Tokenize question bank text (useful for testing).
pub fn parse_bank_str(content: &str, source: &Path) -> QuestionBank {
    let mut rows = tokenize_lines(content).into_iter();
    let header = rows.next().unwrap_or_default();
    QuestionBank {
        source: source.to_path_buf(),
        header,
        rows: rows.collect(),
    }
}

/// Recursively load all `.csv` banks from a directory, sorted by path.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    collect_csv_paths(dir, &mut paths)?;
    paths.sort();

    let mut banks = Vec::new();
    for path in paths {
        match load_bank(&path) {
            Ok(bank) => banks.push(bank),
            Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(banks)
}

fn collect_csv_paths(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_csv_paths(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based data row number (header excluded), if the warning is row-specific.
    pub row: Option<usize>,
    pub message: String,
}

/// Check a bank for common authoring mistakes.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.header.is_empty() {
        warnings.push(ValidationWarning {
            row: None,
            message: "file has no header row".into(),
        });
        return warnings;
    }

    let present: HashSet<&str> = bank.header.iter().map(|h| h.trim()).collect();
    for column in QUESTION_COLUMNS {
        if !present.contains(column) {
            warnings.push(ValidationWarning {
                row: None,
                message: format!("header is missing column: {column}"),
            });
        }
    }

    let mut seen = HashSet::new();
    for (idx, row) in bank.rows.iter().enumerate() {
        let row_no = Some(idx + 1);

        if row.len() != bank.header.len() {
            warnings.push(ValidationWarning {
                row: row_no,
                message: format!(
                    "row has {} fields, header has {}",
                    row.len(),
                    bank.header.len()
                ),
            });
        }

        let question = Question::from_row(&bank.header, row);
        if question.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                row: row_no,
                message: "question text is empty".into(),
            });
            continue;
        }

        if !seen.insert((question.dot_point_id.clone(), question.question.clone())) {
            warnings.push(ValidationWarning {
                row: row_no,
                message: format!(
                    "duplicate question for dotpoint {}: {}",
                    question.dot_point_id, question.question
                ),
            });
        }
    }

    warnings
}
