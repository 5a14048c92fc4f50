//! Deploy phase errors.

use stackrun_core::{ProcessOutcome, StackName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A deploy process exited unsuccessfully or could not be started.
    /// Later stacks were not started.
    #[error(
        "deploy of stack {} failed with {}",
        .outcome.stack,
        .outcome.failure_reason()
    )]
    ProcessFailed {
        outcome: ProcessOutcome,
        /// Outcomes of the stacks that succeeded before the failure.
        completed: Vec<ProcessOutcome>,
    },
}

impl ExecutorError {
    /// Stack the deploy phase stopped at.
    pub fn stack(&self) -> &StackName {
        match self {
            ExecutorError::ProcessFailed { outcome, .. } => &outcome.stack,
        }
    }

    /// Every outcome recorded before the sequence stopped, ending with the
    /// failed stack.
    pub fn attempted(&self) -> Vec<ProcessOutcome> {
        match self {
            ExecutorError::ProcessFailed { outcome, completed } => {
                let mut attempted = completed.clone();
                attempted.push(outcome.clone());
                attempted
            }
        }
    }
}
