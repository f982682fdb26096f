//! Dev-server bootstrap errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the bootstrap sequence.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A port variable held something other than a TCP port.
    #[error("invalid port in {var}: {value:?}")]
    InvalidPort { var: &'static str, value: String },

    /// The `.env` file exists but could not be parsed.
    #[error("failed to load {}: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },

    /// A child process could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A captured command ran past its deadline.
    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    /// The dependency install command exited unsuccessfully.
    #[error("{manager} install failed (exit code {code:?})")]
    InstallFailed { manager: String, code: Option<i32> },

    /// The install finished but the marker dependency is still missing.
    #[error("marker dependency '{0}' is still missing after install")]
    MarkerMissing(String),

    /// The dev server exited unsuccessfully.
    #[error("dev server exited with code {0:?}")]
    DevServerExited(Option<i32>),
}
