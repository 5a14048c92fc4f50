//! Run errors. Every fatal error names its phase and the offending stack or key.

use stackrun_core::StackName;
use stackrun_executor::ExecutorError;
use thiserror::Error;

/// Fetching a stack's outputs failed.
#[derive(Debug, Error)]
#[error("failed to fetch outputs of stack {stack}: {message}")]
pub struct AggregationError {
    pub stack: StackName,
    pub message: String,
}

/// Writing the aggregate state to the config store failed.
#[derive(Debug, Error)]
#[error("failed to publish state under {key}: {message}")]
pub struct PublishError {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("stack selection failed: {0}")]
    Selection(#[from] stackrun_core::Error),

    #[error("deploy phase failed: {0}")]
    Deploy(#[from] ExecutorError),

    #[error("aggregation phase failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("publish phase failed: {0}")]
    Publish(#[from] PublishError),
}
