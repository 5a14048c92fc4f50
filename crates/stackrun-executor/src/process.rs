//! Local deploy process runner.

use async_trait::async_trait;
use chrono::Utc;
use stackrun_core::{DeploySpec, ProcessOutcome, ProcessRunner};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs deploy processes on the local machine with the operator's terminal
/// attached, so tool output is shown live.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessRunner;

impl LocalProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for LocalProcessRunner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn run(&self, spec: &DeploySpec) -> ProcessOutcome {
        debug!(stack = %spec.stack, env = ?spec.env.keys().collect::<Vec<_>>(), "Spawning deploy process");

        let started_at = Utc::now();
        let mut child = match Command::new(&spec.command)
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let message = format!("failed to spawn {}: {}", spec.command, e);
                warn!(stack = %spec.stack, error = %message, "Deploy process could not be started");
                return ProcessOutcome::from_error(
                    spec.stack.clone(),
                    message,
                    started_at,
                    Utc::now(),
                );
            }
        };

        // No timeout: the deploy tool is trusted to terminate.
        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                let message = format!("failed to wait for {}: {}", spec.command, e);
                warn!(stack = %spec.stack, error = %message, "Lost track of deploy process");
                return ProcessOutcome::from_error(
                    spec.stack.clone(),
                    message,
                    started_at,
                    Utc::now(),
                );
            }
        };
        let finished_at = Utc::now();

        let outcome =
            ProcessOutcome::from_exit(spec.stack.clone(), status.code(), started_at, finished_at);
        if outcome.succeeded {
            info!(stack = %spec.stack, "Deploy process exited successfully");
        } else {
            warn!(
                stack = %spec.stack,
                exit_code = %outcome.exit_code_display(),
                "Deploy process exited unsuccessfully"
            );
        }

        outcome
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use stackrun_core::StackName;
    use std::collections::BTreeMap;

    fn shell(script: &str) -> DeploySpec {
        DeploySpec {
            stack: StackName::registry("test"),
            command: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let outcome = LocalProcessRunner::new().run(&shell("exit 0")).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.started_at <= outcome.finished_at);
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails_with_code() {
        let outcome = LocalProcessRunner::new().run(&shell("exit 3")).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stack.as_str(), "registry-test");
    }

    #[tokio::test]
    async fn test_env_overrides_reach_the_process() {
        let mut spec = shell(r#"test "$STACK_ENV" = dev && test -n "$PATH""#);
        spec.env.insert("STACK_ENV".to_string(), "dev".to_string());

        let outcome = LocalProcessRunner::new().run(&spec).await;
        assert!(outcome.succeeded);
    }

    #[tokio::test]
    async fn test_signal_termination_is_failure() {
        let outcome = LocalProcessRunner::new().run(&shell("kill -9 $$")).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_failed_outcome() {
        let mut spec = shell("");
        spec.command = "/nonexistent/stackrun-deploy-tool".to_string();

        let outcome = LocalProcessRunner::new().run(&spec).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, None);
        let error = outcome.error.unwrap();
        assert!(error.starts_with("failed to spawn /nonexistent/stackrun-deploy-tool"), "{error}");
    }
}
