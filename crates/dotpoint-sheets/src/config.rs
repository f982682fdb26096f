//! Sync configuration and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dotpoint_core::engine::SyncJob;
use dotpoint_core::traits::SpreadsheetBackend;

use crate::auth::{ServiceAccountTokenSource, StaticTokenSource, TokenSource};
use crate::google::GoogleSheetsClient;

/// A CSV file and the tab it belongs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    pub path: PathBuf,
    /// Target tab. Defaults to the file stem.
    #[serde(default)]
    pub tab: Option<String>,
}

impl FileMapping {
    pub fn to_job(&self) -> SyncJob {
        match &self.tab {
            Some(tab) => SyncJob::new(&self.path, tab),
            None => SyncJob::for_path(&self.path),
        }
    }
}

/// Top-level dotpoint configuration.
///
/// Note: Custom Debug impl masks the access token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct DotpointConfig {
    /// Spreadsheet document id.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Path to the service-account credential file.
    #[serde(default)]
    pub credentials: Option<PathBuf>,
    /// Pre-obtained bearer token; takes precedence over `credentials`.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Sheets API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Files synced when none are given on the command line.
    #[serde(default)]
    pub files: Vec<FileMapping>,
}

impl std::fmt::Debug for DotpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DotpointConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("credentials", &self.credentials)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("files", &self.files)
            .finish()
    }
}

impl Default for DotpointConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            credentials: None,
            access_token: None,
            base_url: None,
            files: Vec::new(),
        }
    }
}

impl DotpointConfig {
    /// Sync jobs for the configured files.
    pub fn jobs(&self) -> Vec<SyncJob> {
        self.files.iter().map(FileMapping::to_job).collect()
    }

    /// Tab configured for `path`, if any.
    pub fn tab_for(&self, path: &Path) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .and_then(|f| f.tab.as_deref())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + len];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_config(mut config: DotpointConfig) -> DotpointConfig {
    config.spreadsheet_id = resolve_env_vars(&config.spreadsheet_id);
    config.credentials = config
        .credentials
        .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy())));
    config.access_token = config.access_token.map(|t| resolve_env_vars(&t));
    config.base_url = config.base_url.map(|u| resolve_env_vars(&u));
    config
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `dotpoint.toml` in the current directory
/// 2. `~/.config/dotpoint/config.toml`
///
/// Environment variable overrides: `DOTPOINT_SPREADSHEET_ID`,
/// `DOTPOINT_CREDENTIALS`, `DOTPOINT_ACCESS_TOKEN`.
pub fn load_config() -> Result<DotpointConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<DotpointConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("dotpoint.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<DotpointConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => DotpointConfig::default(),
    };

    // Apply env var overrides
    if let Ok(id) = std::env::var("DOTPOINT_SPREADSHEET_ID") {
        config.spreadsheet_id = id;
    }
    if let Ok(creds) = std::env::var("DOTPOINT_CREDENTIALS") {
        config.credentials = Some(PathBuf::from(creds));
    }
    if let Ok(token) = std::env::var("DOTPOINT_ACCESS_TOKEN") {
        config.access_token = Some(token);
    }

    Ok(resolve_config(config))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("dotpoint"))
}

/// Build the token source the config asks for.
pub fn create_token_source(config: &DotpointConfig) -> Result<Arc<dyn TokenSource>> {
    if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Arc::new(StaticTokenSource::new(token)));
    }

    let Some(path) = &config.credentials else {
        anyhow::bail!(
            "no credentials configured: set `credentials` in dotpoint.toml, \
             DOTPOINT_CREDENTIALS, or DOTPOINT_ACCESS_TOKEN"
        );
    };

    let source = ServiceAccountTokenSource::from_file(path)
        .with_context(|| format!("failed to load credentials from {}", path.display()))?;
    Ok(Arc::new(source))
}

/// Create the spreadsheet backend described by the config.
pub fn create_backend(config: &DotpointConfig) -> Result<Arc<dyn SpreadsheetBackend>> {
    anyhow::ensure!(
        !config.spreadsheet_id.trim().is_empty(),
        "no spreadsheet id configured: set `spreadsheet_id` in dotpoint.toml or DOTPOINT_SPREADSHEET_ID"
    );

    let tokens = create_token_source(config)?;
    let client = GoogleSheetsClient::new(&config.spreadsheet_id, tokens, config.base_url.clone())?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_DOTPOINT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_DOTPOINT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_DOTPOINT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        assert_eq!(
            resolve_env_vars("${_DOTPOINT_TEST_VAR}-${_DOTPOINT_TEST_VAR}-${tail"),
            "hello-hello-${tail"
        );
        std::env::remove_var("_DOTPOINT_TEST_VAR");
    }

    #[test]
    fn self_referencing_var_is_substituted_once() {
        std::env::set_var("_DOTPOINT_SELF_REF", "${_DOTPOINT_SELF_REF}");
        std::env::set_var("_DOTPOINT_GROWING", "a${_DOTPOINT_GROWING}");
        assert_eq!(
            resolve_env_vars("${_DOTPOINT_SELF_REF}"),
            "${_DOTPOINT_SELF_REF}"
        );
        assert_eq!(
            resolve_env_vars("x${_DOTPOINT_GROWING}y"),
            "xa${_DOTPOINT_GROWING}y"
        );
        std::env::remove_var("_DOTPOINT_SELF_REF");
        std::env::remove_var("_DOTPOINT_GROWING");
    }

    #[test]
    fn parse_config_with_files() {
        let toml_str = r#"
spreadsheet_id = "abc123"
credentials = "service-account.json"

[[files]]
path = "data/module5.csv"
tab = "Module 5"

[[files]]
path = "data/acids.csv"
"#;
        let config: DotpointConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.spreadsheet_id, "abc123");

        let jobs = config.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].tab, "Module 5");
        assert_eq!(jobs[1].tab, "acids");
        assert_eq!(config.tab_for(Path::new("data/module5.csv")), Some("Module 5"));
        assert_eq!(config.tab_for(Path::new("data/acids.csv")), None);
    }

    #[test]
    fn debug_masks_access_token() {
        let config = DotpointConfig {
            access_token: Some("ya29.secret".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn backend_requires_spreadsheet_id() {
        let err = create_backend(&DotpointConfig::default()).err().unwrap();
        assert!(err.to_string().contains("no spreadsheet id"));
    }

    #[test]
    fn token_source_requires_some_credential() {
        let config = DotpointConfig {
            spreadsheet_id: "abc".into(),
            ..Default::default()
        };
        let err = create_token_source(&config).err().unwrap();
        assert!(err.to_string().contains("no credentials configured"));
    }

    #[test]
    fn explicit_missing_config_path_errors() {
        let err = load_config_from(Some(Path::new("/nonexistent/dotpoint.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
