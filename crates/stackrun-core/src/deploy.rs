//! Deploy specifications and the process runner trait.
//!
//! Each stack is deployed by one external process. Runners report how that
//! process ended; sequencing lives in the executor crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::StackName;

/// Specification for deploying one stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySpec {
    /// Stack this spec deploys.
    pub stack: StackName,
    /// Program to execute.
    pub command: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Environment variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl DeploySpec {
    /// Command and arguments joined for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a deploy process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub stack: StackName,
    /// Exit code, `None` when the process was terminated by a signal or
    /// never started.
    pub exit_code: Option<i32>,
    /// Why the process could not be started or waited on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub succeeded: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProcessOutcome {
    pub fn from_exit(
        stack: StackName,
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack,
            exit_code,
            error: None,
            succeeded: exit_code == Some(0),
            started_at,
            finished_at,
        }
    }

    /// Outcome of a process that could not be spawned or waited on.
    pub fn from_error(
        stack: StackName,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack,
            exit_code: None,
            error: Some(error.into()),
            succeeded: false,
            started_at,
            finished_at,
        }
    }

    /// Exit code rendered for messages (`signal` when killed, `none` when the
    /// process never ran).
    pub fn exit_code_display(&self) -> String {
        match (self.exit_code, &self.error) {
            (Some(code), _) => code.to_string(),
            (None, Some(_)) => "none".to_string(),
            (None, None) => "signal".to_string(),
        }
    }

    /// Why the process failed, e.g. `exit code 2` or the spawn error.
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(error) => error.clone(),
            None => format!("exit code {}", self.exit_code_display()),
        }
    }
}

/// Runs a single deploy process to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Name of this runner.
    fn name(&self) -> &'static str;

    /// Spawn the process described by `spec` and wait for it to exit.
    ///
    /// Never fails: a process that could not be started is a failed outcome
    /// carrying the error.
    async fn run(&self, spec: &DeploySpec) -> ProcessOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let spec = DeploySpec {
            stack: StackName::registry("do-k8s"),
            command: "cdktf".to_string(),
            args: vec![
                "deploy".to_string(),
                "registry-do-k8s".to_string(),
                "--auto-approve".to_string(),
            ],
            env: BTreeMap::new(),
        };
        assert_eq!(spec.command_line(), "cdktf deploy registry-do-k8s --auto-approve");
    }

    #[test]
    fn test_outcome_success_only_on_zero() {
        let now = Utc::now();
        let stack = StackName::registry("x");
        assert!(ProcessOutcome::from_exit(stack.clone(), Some(0), now, now).succeeded);
        assert!(!ProcessOutcome::from_exit(stack.clone(), Some(2), now, now).succeeded);

        let killed = ProcessOutcome::from_exit(stack, None, now, now);
        assert!(!killed.succeeded);
        assert_eq!(killed.exit_code_display(), "signal");
        assert_eq!(killed.failure_reason(), "exit code signal");
    }

    #[test]
    fn test_spawn_error_is_failed_outcome() {
        let now = Utc::now();
        let outcome = ProcessOutcome::from_error(
            StackName::registry("x"),
            "failed to spawn cdktf: No such file or directory",
            now,
            now,
        );
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, None);
        assert_eq!(outcome.exit_code_display(), "none");
        assert_eq!(
            outcome.failure_reason(),
            "failed to spawn cdktf: No such file or directory"
        );
    }
}
