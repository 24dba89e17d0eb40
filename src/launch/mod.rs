//! Process launch and shutdown relay.
//!
//! The launcher is a thin parent: it starts the planned process in the app
//! directory, hands its output straight through, and when the platform asks
//! for shutdown it forwards the signal and gives the app a bounded grace
//! period to finish on its own. Apps that trap the signal get to flush and
//! say goodbye; apps that ignore it are killed when the grace period ends.

use crate::staging::LaunchSpec;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, ChildStdout, Command};
use tokio::time;
use tracing::{debug, warn};

/// How long a signalled app may keep running before it is killed.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install signal handler: {0}")]
    Handler(#[source] std::io::Error),
    #[error("failed while waiting for the application: {0}")]
    Wait(#[source] std::io::Error),
    #[error("the launched process has already gone away")]
    Gone,
}

/// How a shutdown ended.
#[derive(Debug)]
pub enum ShutdownOutcome {
    /// The app exited within the grace period after being signalled.
    Graceful(ExitStatus),
    /// The grace period elapsed and the app was killed.
    Forced,
}

impl ShutdownOutcome {
    pub fn was_graceful(&self) -> bool {
        matches!(self, ShutdownOutcome::Graceful(_))
    }
}

/// A running application process.
#[derive(Debug)]
pub struct LaunchedApp {
    child: Child,
    program: String,
}

impl LaunchedApp {
    /// Starts the planned process in `app_dir` with inherited stdio.
    pub fn spawn(spec: &LaunchSpec, app_dir: &Path) -> Result<Self, LaunchError> {
        Self::spawn_inner(spec, app_dir, Stdio::inherit())
    }

    /// Starts the planned process with piped stdout, for callers that watch
    /// the app's output (health checks, shutdown-message probes).
    pub fn spawn_captured(spec: &LaunchSpec, app_dir: &Path) -> Result<Self, LaunchError> {
        Self::spawn_inner(spec, app_dir, Stdio::piped())
    }

    fn spawn_inner(spec: &LaunchSpec, app_dir: &Path, stdout: Stdio) -> Result<Self, LaunchError> {
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(app_dir)
            .stdout(stdout)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: spec.program.clone(),
                source,
            })?;
        debug!(program = %spec.program, pid = child.id(), "launched application");
        Ok(Self {
            child,
            program: spec.program.clone(),
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Forwards SIGTERM to the application process.
    pub fn signal_term(&self) -> Result<(), LaunchError> {
        let pid = self.child.id().ok_or(LaunchError::Gone)?;
        #[cfg(unix)]
        {
            let status = std::process::Command::new("kill")
                .args(["-TERM", &pid.to_string()])
                .status()
                .map_err(|source| LaunchError::Signal { pid, source })?;
            if !status.success() {
                warn!(pid, "kill -TERM reported failure; process may have exited");
            }
        }
        #[cfg(not(unix))]
        {
            warn!(pid, "signal relay is not supported on this platform");
        }
        Ok(())
    }

    /// Waits for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus, LaunchError> {
        self.child.wait().await.map_err(LaunchError::Wait)
    }

    /// Signals the app, then waits out the grace period. The process is
    /// killed if it is still running when the period ends.
    pub async fn shutdown(mut self, grace: Duration) -> Result<ShutdownOutcome, LaunchError> {
        self.signal_term()?;
        match time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(LaunchError::Wait)?;
                debug!(program = %self.program, %status, "application exited gracefully");
                Ok(ShutdownOutcome::Graceful(status))
            }
            Err(_) => {
                warn!(program = %self.program, grace_secs = grace.as_secs(), "grace period elapsed, killing application");
                self.child.kill().await.map_err(LaunchError::Wait)?;
                Ok(ShutdownOutcome::Forced)
            }
        }
    }
}

/// Runs the app until it exits or the platform asks this process to stop.
///
/// SIGTERM and SIGINT arriving here are relayed to the app rather than acted
/// on directly, so the app always gets its chance at a clean exit. Returns
/// the code the platform should exit with.
#[cfg(unix)]
pub async fn supervise(
    spec: &LaunchSpec,
    app_dir: &Path,
    grace: Duration,
) -> Result<i32, LaunchError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut app = LaunchedApp::spawn(spec, app_dir)?;
    let mut term = signal(SignalKind::terminate()).map_err(LaunchError::Handler)?;
    let mut int = signal(SignalKind::interrupt()).map_err(LaunchError::Handler)?;

    tokio::select! {
        status = app.wait() => {
            let status = status?;
            debug!(%status, "application exited");
            Ok(status.code().unwrap_or(1))
        }
        _ = term.recv() => relay_and_exit(app, grace).await,
        _ = int.recv() => relay_and_exit(app, grace).await,
    }
}

#[cfg(unix)]
async fn relay_and_exit(app: LaunchedApp, grace: Duration) -> Result<i32, LaunchError> {
    debug!("shutdown requested, relaying to application");
    match app.shutdown(grace).await? {
        ShutdownOutcome::Graceful(status) => Ok(status.code().unwrap_or(0)),
        ShutdownOutcome::Forced => Ok(137),
    }
}

/// Without unix signals there is nothing to relay; run to completion.
#[cfg(not(unix))]
pub async fn supervise(
    spec: &LaunchSpec,
    app_dir: &Path,
    _grace: Duration,
) -> Result<i32, LaunchError> {
    let mut app = LaunchedApp::spawn(spec, app_dir)?;
    let status = app.wait().await?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_spec(script: &str) -> LaunchSpec {
        LaunchSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[tokio::test]
    async fn test_wait_returns_exit_status() {
        let spec = shell_spec("exit 3");
        let mut app = LaunchedApp::spawn_captured(&spec, Path::new(".")).unwrap();
        let status = app.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_shutdown_within_grace_is_graceful() {
        let spec = shell_spec("trap 'exit 0' TERM; while true; do sleep 0.05; done");
        let app = LaunchedApp::spawn_captured(&spec, Path::new(".")).unwrap();
        // Give the shell a moment to install its trap.
        time::sleep(Duration::from_millis(200)).await;

        let outcome = app.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(outcome.was_graceful());
    }

    #[tokio::test]
    async fn test_shutdown_kills_after_grace() {
        let spec = shell_spec("trap '' TERM; while true; do sleep 0.05; done");
        let app = LaunchedApp::spawn_captured(&spec, Path::new(".")).unwrap();
        time::sleep(Duration::from_millis(200)).await;

        let outcome = app.shutdown(Duration::from_millis(300)).await.unwrap();
        assert!(!outcome.was_graceful());
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let spec = LaunchSpec {
            program: "/nonexistent/dotnet".to_string(),
            args: vec![],
        };
        let err = LaunchedApp::spawn_captured(&spec, Path::new(".")).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }
}
