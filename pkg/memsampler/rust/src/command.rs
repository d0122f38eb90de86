// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::ProbeError;
use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Locale forced on every probe command so numeric output does not depend on
/// the operator's environment.
const PINNED_LOCALE: [(&str, &str); 2] = [("LC_ALL", "C"), ("LANG", "C")];

/// An external command invocation: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: PINNED_LOCALE
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs an external command to completion and returns its stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<String, ProbeError>;
}

/// Spawns real child processes.
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<String, ProbeError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out child is dropped with the future below.
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ProbeError::Spawn {
                    command: spec.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(ProbeError::TimedOut {
                    command: spec.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(ProbeError::Failed {
                command: spec.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("`{spec}` returned {} bytes", stdout.len());
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_pins_locale() {
        let spec = CommandSpec::new("free", &["-m", "-w"]);
        assert_eq!(spec.args, vec!["-m", "-w"]);
        assert!(spec.env.contains(&("LC_ALL".to_string(), "C".to_string())));
        assert!(spec.env.contains(&("LANG".to_string(), "C".to_string())));
    }

    #[test]
    fn test_spec_display() {
        let spec = CommandSpec::new("du", &["-sm", "/var/log"]);
        assert_eq!(spec.to_string(), "du -sm /var/log");
        assert_eq!(CommandSpec::new("free", &[]).to_string(), "free");
    }

    #[tokio::test]
    async fn test_run_returns_stdout() {
        let runner = SystemCommandRunner::default();
        let out = runner
            .run(&CommandSpec::new("/bin/sh", &["-c", "echo hello"]))
            .await
            .unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_run_applies_pinned_locale() {
        let runner = SystemCommandRunner::default();
        let out = runner
            .run(&CommandSpec::new("/bin/sh", &["-c", "echo $LC_ALL"]))
            .await
            .unwrap();
        assert_eq!(out.trim(), "C");
    }

    #[tokio::test]
    async fn test_run_nonexistent_binary() {
        let runner = SystemCommandRunner::default();
        let err = runner
            .run(&CommandSpec::new("/nonexistent/binary", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }), "got {err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let runner = SystemCommandRunner::default();
        let err = runner
            .run(&CommandSpec::new("/bin/sh", &["-c", "echo denied >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            ProbeError::Failed {
                command,
                code,
                stderr,
            } => {
                assert!(command.starts_with("/bin/sh -c"));
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "denied");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = SystemCommandRunner::new(Duration::from_millis(100));
        let err = runner
            .run(&CommandSpec::new("/bin/sleep", &["5"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut { .. }), "got {err:?}");
    }
}
