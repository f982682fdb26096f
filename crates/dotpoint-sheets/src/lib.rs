//! dotpoint-sheets: spreadsheet backends for dotpoint.
//!
//! Implements the `SpreadsheetBackend` trait against the Google Sheets v4 API,
//! plus an in-memory mock, and loads the sync configuration that selects
//! credentials and target tabs.

pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod mock;

pub use auth::{ServiceAccountTokenSource, StaticTokenSource, TokenSource};
pub use config::{create_backend, load_config, load_config_from, DotpointConfig, FileMapping};
pub use error::SheetsError;
pub use google::GoogleSheetsClient;
pub use mock::MockSpreadsheet;
