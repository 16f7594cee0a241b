//! External process execution
//!
//! Every tool the pipeline drives (rustup, cargo, strip, upx, the package
//! managers) goes through a `CommandRunner`. The system implementation runs
//! the command on the host with a wall-clock limit and kills the child when
//! the limit expires.

use anyhow::{Context, Result};
use async_trait::async_trait;
use shipyard_core::domain::step::CommandSpec;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code recorded for a step killed by its timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A fully specified command invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandSpec,
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment, layered over the inherited one
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
}

/// Captured result of a finished (or killed) process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Output of a process that exited normally with `code`
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    /// Output of a process killed after `timeout`
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: Some(TIMEOUT_EXIT_CODE),
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs()),
            timed_out: true,
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, for diagnostics
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", "") => String::new(),
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion or until its timeout
    ///
    /// A non-zero exit or a timeout is a normal `Ok` result; `Err` is
    /// reserved for the process not starting at all.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands on the local host
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(
            "Executing process: {} (cwd: {})",
            invocation.command,
            invocation.cwd.display()
        );

        let child = Command::new(&invocation.command.program)
            .args(&invocation.command.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute '{}'", invocation.command))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output
                    .with_context(|| format!("Failed to wait for '{}'", invocation.command))?;
                Ok(CommandOutput {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                })
            }
            Err(_) => {
                warn!(
                    "'{}' exceeded {:?}, killing it",
                    invocation.command, invocation.timeout
                );
                Ok(CommandOutput::timed_out(invocation.timeout))
            }
        }
    }
}
