//! The `dotpoint dev` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use dotpoint_devserver::{Bootstrap, DevConfig, TokioProcessRunner};

pub async fn execute(project_dir: Option<PathBuf>, marker: Option<String>) -> Result<()> {
    let project_dir = project_dir.unwrap_or_else(|| PathBuf::from("."));
    let config = DevConfig::load(&project_dir, marker.as_deref())
        .context("failed to resolve dev server settings")?;

    let bootstrap = Bootstrap::new(config, Arc::new(TokioProcessRunner));
    let summary = bootstrap
        .run()
        .await
        .context("dev server bootstrap failed")?;
    tracing::debug!("dev server exited cleanly: {:?}", summary);
    Ok(())
}
