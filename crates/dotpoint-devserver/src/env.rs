//! Environment resolution for the dev server.
//!
//! Values come from the process environment first and the project's `.env`
//! file second. Empty values count as unset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::BootstrapError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PROXY_TARGET: &str = "http://localhost:8080";
pub const DEFAULT_APP_VERSION: &str = "0.0.0";
pub const DEFAULT_MARKER: &str = "vite";

/// Layered view of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    process: BTreeMap<String, String>,
    file: BTreeMap<String, String>,
}

impl EnvVars {
    /// Current process environment layered over `<project_dir>/.env`.
    pub fn load(project_dir: &Path) -> Result<Self, BootstrapError> {
        let path = project_dir.join(".env");
        let mut file = BTreeMap::new();
        if path.exists() {
            let iter = dotenvy::from_path_iter(&path).map_err(|e| BootstrapError::EnvFile {
                path: path.clone(),
                message: e.to_string(),
            })?;
            for item in iter {
                let (key, value) = item.map_err(|e| BootstrapError::EnvFile {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                file.insert(key, value);
            }
            tracing::debug!("loaded {} variables from {}", file.len(), path.display());
        }

        Ok(Self {
            process: std::env::vars().collect(),
            file,
        })
    }

    pub fn from_pairs<'a>(
        process: impl IntoIterator<Item = (&'a str, &'a str)>,
        file: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let owned = |(k, v): (&str, &str)| (k.to_string(), v.to_string());
        Self {
            process: process.into_iter().map(owned).collect(),
            file: file.into_iter().map(owned).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.process
            .get(key)
            .or_else(|| self.file.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `.env` entries the process environment does not already define.
    pub fn file_only(&self) -> impl Iterator<Item = (&str, &str)> {
        self.file
            .iter()
            .filter(|(k, _)| !self.process.contains_key(*k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Package manager used to install dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    /// Pick the manager whose lockfile is present.
    pub fn detect(project_dir: &Path) -> Self {
        if project_dir.join("pnpm-lock.yaml").exists() {
            PackageManager::Pnpm
        } else if project_dir.join("yarn.lock").exists() {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Executable name, with the `.cmd` shim on Windows.
    pub fn program(self) -> String {
        shim(self.name())
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn shim(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.cmd")
    } else {
        name.to_string()
    }
}

/// Everything the bootstrap needs to know, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
    pub project_dir: PathBuf,
    pub port: u16,
    pub host: String,
    pub marker: String,
    pub package_manager: PackageManager,
    pub proxy_target: String,
    pub app_version: String,
    /// Variables exported to the dev server on top of the inherited environment.
    pub exports: Vec<(String, String)>,
}

impl DevConfig {
    /// Load `.env` and resolve against the real environment.
    pub fn load(project_dir: &Path, marker: Option<&str>) -> Result<Self, BootstrapError> {
        let vars = EnvVars::load(project_dir)?;
        Self::resolve(project_dir, marker, &vars)
    }

    pub fn resolve(
        project_dir: &Path,
        marker: Option<&str>,
        vars: &EnvVars,
    ) -> Result<Self, BootstrapError> {
        let port = resolve_port(vars)?;
        let host = vars.get("VITE_HOST").unwrap_or(DEFAULT_HOST).to_string();
        let proxy_target = resolve_proxy_target(vars);
        let app_version = match vars.get("VITE_APP_VERSION") {
            Some(v) => v.to_string(),
            None => package_version(project_dir).unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
        };

        let mut exports: Vec<(String, String)> = vars
            .file_only()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        exports.retain(|(k, _)| k != "VITE_GATEWAY_URL" && k != "VITE_APP_VERSION");
        exports.push(("VITE_GATEWAY_URL".into(), proxy_target.clone()));
        exports.push(("VITE_APP_VERSION".into(), app_version.clone()));

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            port,
            host,
            marker: marker.unwrap_or(DEFAULT_MARKER).to_string(),
            package_manager: PackageManager::detect(project_dir),
            proxy_target,
            app_version,
            exports,
        })
    }

    /// `node_modules/<marker>/package.json`, whose presence means installed.
    pub fn marker_manifest(&self) -> PathBuf {
        self.project_dir
            .join("node_modules")
            .join(&self.marker)
            .join("package.json")
    }
}

fn resolve_port(vars: &EnvVars) -> Result<u16, BootstrapError> {
    for var in ["VITE_PORT", "PORT"] {
        if let Some(value) = vars.get(var) {
            return value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| BootstrapError::InvalidPort {
                    var,
                    value: value.to_string(),
                });
        }
    }
    Ok(DEFAULT_PORT)
}

fn resolve_proxy_target(vars: &EnvVars) -> String {
    let target = vars
        .get("VITE_GATEWAY_URL")
        .or_else(|| vars.get("VITE_API_BASE_URL"))
        .unwrap_or(DEFAULT_PROXY_TARGET);
    target.trim_end_matches('/').to_string()
}

fn package_version(project_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(project_dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
    manifest
        .get("version")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .map(String::from)
}
