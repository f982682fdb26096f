//! Freeing the dev server's port before launch.

use std::time::Duration;

use crate::env::{shim, DevConfig};
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};

const KILL_PORT_TIMEOUT: Duration = Duration::from_secs(60);
const NOT_RUNNING: &str = "not running on port";

/// Result of trying to free the port. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRelease {
    /// A process held the port and was stopped.
    Freed,
    /// Nothing was listening.
    AlreadyFree,
    /// The port killer failed for some other reason.
    Warning(String),
}

/// Classify the port killer's output.
pub fn classify(output: &CommandOutput) -> PortRelease {
    let combined = output.combined();
    if combined.contains(NOT_RUNNING) {
        PortRelease::AlreadyFree
    } else if output.success() {
        PortRelease::Freed
    } else {
        let detail = combined.trim();
        PortRelease::Warning(if detail.is_empty() {
            format!("kill-port exited with code {:?}", output.code)
        } else {
            detail.to_string()
        })
    }
}

pub fn kill_port_command(config: &DevConfig) -> CommandSpec {
    CommandSpec::new(&shim("npx"), &config.project_dir)
        .arg("kill-port")
        .arg(config.port.to_string())
        .timeout(KILL_PORT_TIMEOUT)
}

pub async fn free_port(runner: &dyn ProcessRunner, config: &DevConfig) -> PortRelease {
    let release = match runner.output(&kill_port_command(config)).await {
        Ok(output) => classify(&output),
        Err(e) => PortRelease::Warning(e.to_string()),
    };

    match &release {
        PortRelease::Freed => tracing::info!("freed port {}", config.port),
        PortRelease::AlreadyFree => tracing::debug!("port {} already free", config.port),
        PortRelease::Warning(msg) => {
            tracing::warn!("could not free port {}: {}", config.port, msg)
        }
    }
    release
}
