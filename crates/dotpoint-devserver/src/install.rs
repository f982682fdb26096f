//! Marker-dependency check and install.

use crate::env::DevConfig;
use crate::error::BootstrapError;
use crate::process::{CommandSpec, ProcessRunner};

/// What the install step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled,
    Installed,
}

pub fn marker_installed(config: &DevConfig) -> bool {
    config.marker_manifest().is_file()
}

/// Install dependencies unless the marker dependency is already present.
///
/// The install streams to the terminal, so a slow install shows progress.
pub async fn ensure_installed(
    runner: &dyn ProcessRunner,
    config: &DevConfig,
) -> Result<InstallOutcome, BootstrapError> {
    if marker_installed(config) {
        tracing::debug!("{} present, skipping install", config.marker_manifest().display());
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let manager = config.package_manager;
    tracing::info!("'{}' not installed, running {} install", config.marker, manager);
    let spec = CommandSpec::new(&manager.program(), &config.project_dir).arg("install");
    let code = runner.run_inherited(&spec).await?;

    if code != Some(0) {
        return Err(BootstrapError::InstallFailed {
            manager: manager.to_string(),
            code,
        });
    }
    if !marker_installed(config) {
        return Err(BootstrapError::MarkerMissing(config.marker.clone()));
    }

    Ok(InstallOutcome::Installed)
}
