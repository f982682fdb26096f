//! The `dotpoint validate` command.

use std::path::PathBuf;

use anyhow::Result;

use dotpoint_core::bank::{load_bank, load_bank_directory, validate_bank};

pub fn execute(path: PathBuf) -> Result<()> {
    let banks = if path.is_dir() {
        load_bank_directory(&path)?
    } else {
        vec![load_bank(&path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        println!(
            "Question bank: {} ({} rows, tab '{}')",
            bank.source.display(),
            bank.rows.len(),
            bank.default_tab()
        );

        let warnings = validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .row
                .map(|row| format!("  [row {row}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if banks.is_empty() {
        println!("No CSV files found in {}.", path.display());
    } else if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
