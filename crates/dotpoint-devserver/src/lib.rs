//! dotpoint-devserver: local dev-server bootstrap.
//!
//! Resolves port and host from the environment, makes sure the web app's
//! dependencies are installed, frees the port, then hands the terminal to
//! the Vite dev server.

pub mod env;
pub mod error;
pub mod install;
pub mod port;
pub mod process;

use std::sync::Arc;

pub use env::{DevConfig, EnvVars, PackageManager};
pub use error::BootstrapError;
pub use install::InstallOutcome;
pub use port::PortRelease;
pub use process::{CommandOutput, CommandSpec, ProcessRunner, TokioProcessRunner};

/// What happened during a bootstrap that reached the dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub install: InstallOutcome,
    pub port: PortRelease,
}

/// The bootstrap sequence.
pub struct Bootstrap {
    config: DevConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl Bootstrap {
    pub fn new(config: DevConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    /// `npx vite --port <port> --host <host>` with the resolved exports.
    pub fn dev_server_command(&self) -> CommandSpec {
        CommandSpec::new(&env::shim("npx"), &self.config.project_dir)
            .arg("vite")
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--host")
            .arg(self.config.host.as_str())
            .envs(&self.config.exports)
    }

    /// Install, free the port, launch. Returns once the dev server exits cleanly.
    pub async fn run(&self) -> Result<BootstrapSummary, BootstrapError> {
        let install = install::ensure_installed(self.runner.as_ref(), &self.config).await?;
        let port = port::free_port(self.runner.as_ref(), &self.config).await;

        let command = self.dev_server_command();
        tracing::info!(
            "starting dev server on http://{}:{} (proxy {})",
            self.config.host,
            self.config.port,
            self.config.proxy_target
        );
        tracing::debug!("running {}", command.display());

        match self.runner.run_inherited(&command).await? {
            Some(0) => Ok(BootstrapSummary { install, port }),
            code => Err(BootstrapError::DevServerExited(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Runner that records commands and replays canned results.
    struct ScriptedRunner {
        calls: Mutex<Vec<String>>,
        install_exit: Option<i32>,
        kill_port: Result<CommandOutput, String>,
        vite_exit: Option<i32>,
        /// Marker manifest written when install runs.
        create_marker: Option<std::path::PathBuf>,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                install_exit: Some(0),
                kill_port: Ok(ok("Process on port 3000 killed")),
                vite_exit: Some(0),
                create_marker: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError> {
            self.calls.lock().unwrap().push(spec.display());
            assert_ne!(
                spec.args.first().map(String::as_str),
                Some("install"),
                "install output must go to the terminal"
            );
            self.kill_port.clone().map_err(|msg| BootstrapError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
            })
        }

        async fn run_inherited(&self, spec: &CommandSpec) -> Result<Option<i32>, BootstrapError> {
            self.calls.lock().unwrap().push(spec.display());
            if spec.args.first().map(String::as_str) == Some("install") {
                if let Some(manifest) = &self.create_marker {
                    std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
                    std::fs::write(manifest, "{}").unwrap();
                }
                return Ok(self.install_exit);
            }
            Ok(self.vite_exit)
        }
    }

    fn config(dir: &Path) -> DevConfig {
        DevConfig::resolve(dir, None, &EnvVars::default()).unwrap()
    }

    fn install_marker(dir: &Path) {
        let marker = dir.join("node_modules/vite");
        std::fs::create_dir_all(&marker).unwrap();
        std::fs::write(marker.join("package.json"), "{}").unwrap();
    }

    fn bootstrap(dir: &Path, runner: &Arc<ScriptedRunner>) -> Bootstrap {
        let runner: Arc<dyn ProcessRunner> = runner.clone();
        Bootstrap::new(config(dir), runner)
    }

    #[tokio::test]
    async fn installed_marker_skips_install() {
        let dir = tempfile::tempdir().unwrap();
        install_marker(dir.path());
        let runner = Arc::new(ScriptedRunner::new());

        let summary = bootstrap(dir.path(), &runner).run().await.unwrap();

        assert_eq!(summary.install, InstallOutcome::AlreadyInstalled);
        let calls = runner.calls();
        assert!(!calls.iter().any(|c| c.ends_with("install")));
        assert_eq!(calls.last().unwrap(), &format!("{} vite --port 3000 --host localhost", env::shim("npx")));
    }

    #[tokio::test]
    async fn missing_marker_runs_install_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let mut runner = ScriptedRunner::new();
        runner.create_marker = Some(dir.path().join("node_modules/vite/package.json"));
        let runner = Arc::new(runner);

        let summary = bootstrap(dir.path(), &runner).run().await.unwrap();

        assert_eq!(summary.install, InstallOutcome::Installed);
        assert_eq!(runner.calls()[0], format!("{} install", env::shim("pnpm")));
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn port_not_running_still_launches() {
        let dir = tempfile::tempdir().unwrap();
        install_marker(dir.path());
        let mut runner = ScriptedRunner::new();
        runner.kill_port = Ok(failed("Error: No process running on port 3000 - not running on port"));
        let runner = Arc::new(runner);

        let summary = bootstrap(dir.path(), &runner).run().await.unwrap();

        assert_eq!(summary.port, PortRelease::AlreadyFree);
        assert!(runner.calls().last().unwrap().contains("vite --port 3000"));
    }

    #[tokio::test]
    async fn other_port_errors_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        install_marker(dir.path());
        let mut runner = ScriptedRunner::new();
        runner.kill_port = Err("npx not found".into());
        let runner = Arc::new(runner);

        let summary = bootstrap(dir.path(), &runner).run().await.unwrap();

        assert!(matches!(summary.port, PortRelease::Warning(ref m) if m.contains("npx not found")));
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_install_aborts_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = ScriptedRunner::new();
        runner.install_exit = Some(1);
        let runner = Arc::new(runner);

        let err = bootstrap(dir.path(), &runner).run().await.unwrap_err();

        assert!(matches!(err, BootstrapError::InstallFailed { code: Some(1), ref manager } if manager == "npm"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn install_killed_by_signal_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = ScriptedRunner::new();
        runner.install_exit = None;
        runner.create_marker = Some(dir.path().join("node_modules/vite/package.json"));
        let runner = Arc::new(runner);

        let err = bootstrap(dir.path(), &runner).run().await.unwrap_err();
        assert!(matches!(err, BootstrapError::InstallFailed { code: None, .. }));
    }

    #[tokio::test]
    async fn install_that_leaves_marker_missing_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());

        let err = bootstrap(dir.path(), &runner).run().await.unwrap_err();
        assert!(matches!(err, BootstrapError::MarkerMissing(ref m) if m == "vite"));
    }

    #[tokio::test]
    async fn dev_server_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        install_marker(dir.path());
        let mut runner = ScriptedRunner::new();
        runner.vite_exit = Some(1);
        let runner = Arc::new(runner);

        let err = bootstrap(dir.path(), &runner).run().await.unwrap_err();
        assert!(matches!(err, BootstrapError::DevServerExited(Some(1))));
    }

    #[test]
    fn dev_server_command_exports_proxy_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let vars = EnvVars::from_pairs(
            [("VITE_PORT", "5173"), ("VITE_HOST", "0.0.0.0")],
            [("VITE_API_BASE_URL", "https://api.example.com/")],
        );
        let config = DevConfig::resolve(dir.path(), None, &vars).unwrap();
        let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner);
        let command = Bootstrap::new(config, runner).dev_server_command();

        assert_eq!(command.args, ["vite", "--port", "5173", "--host", "0.0.0.0"]);
        assert!(command
            .envs
            .contains(&("VITE_GATEWAY_URL".into(), "https://api.example.com".into())));
        assert!(command
            .envs
            .contains(&("VITE_APP_VERSION".into(), "0.0.0".into())));
        assert!(command
            .envs
            .contains(&("VITE_API_BASE_URL".into(), "https://api.example.com/".into())));
    }
}
