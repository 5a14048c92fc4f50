//! Sequential deploy executor.
//!
//! Stacks are ordered by dependency (registry, then environment, then
//! application), so each deploy starts only after the previous one exited
//! successfully.

use crate::ExecutorError;
use stackrun_core::{DeploySpec, ProcessOutcome, ProcessRunner, StackName};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Event emitted while deploying stacks.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    StackStarted { stack: StackName, command_line: String },
    StackFinished { outcome: ProcessOutcome },
}

/// Deploys stacks one at a time, stopping at the first failure.
pub struct SequentialExecutor {
    runner: Arc<dyn ProcessRunner>,
}

impl SequentialExecutor {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Run every spec in order. Returns the outcomes of all stacks on success.
    pub async fn run_all(
        &self,
        specs: &[DeploySpec],
    ) -> Result<Vec<ProcessOutcome>, ExecutorError> {
        self.run_all_with_events::<ExecutionEvent>(specs, None).await
    }

    /// Like [`run_all`](Self::run_all), reporting progress on `events`.
    pub async fn run_all_with_events<E>(
        &self,
        specs: &[DeploySpec],
        events: Option<&mpsc::Sender<E>>,
    ) -> Result<Vec<ProcessOutcome>, ExecutorError>
    where
        E: From<ExecutionEvent> + Send,
    {
        let mut completed = Vec::with_capacity(specs.len());

        for spec in specs {
            let command_line = spec.command_line();
            info!(stack = %spec.stack, runner = self.runner.name(), "Running: {}", command_line);
            if let Some(tx) = events {
                let _ = tx
                    .send(E::from(ExecutionEvent::StackStarted {
                        stack: spec.stack.clone(),
                        command_line: command_line.clone(),
                    }))
                    .await;
            }

            let outcome = self.runner.run(spec).await;

            if let Some(tx) = events {
                let _ = tx
                    .send(E::from(ExecutionEvent::StackFinished {
                        outcome: outcome.clone(),
                    }))
                    .await;
            }

            if !outcome.succeeded {
                error!(
                    stack = %spec.stack,
                    reason = %outcome.failure_reason(),
                    "Failure: {}",
                    command_line
                );
                return Err(ExecutorError::ProcessFailed { outcome, completed });
            }

            info!(stack = %spec.stack, "Finished: {}", command_line);
            completed.push(outcome);
        }

        Ok(completed)
    }
}
