//! Remote workspace API abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, StackName, StackOutput};

/// Result of ensuring a stack's remote workspace exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceProvisionResult {
    pub stack: StackName,
    pub ok: bool,
    pub error: Option<String>,
}

impl WorkspaceProvisionResult {
    pub fn created(stack: StackName) -> Self {
        Self {
            stack,
            ok: true,
            error: None,
        }
    }

    pub fn failed(stack: StackName, error: impl Into<String>) -> Self {
        Self {
            stack,
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Trait for the remote state backend that tracks one workspace per stack.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Create the workspace for `stack`. Calling this for an existing
    /// workspace may return an error; callers treat that as non-fatal.
    async fn create_workspace(&self, org: &str, stack: &StackName, token: &str) -> Result<()>;

    /// Fetch the current output values of the workspace for `stack`.
    async fn get_workspace_outputs(
        &self,
        org: &str,
        stack: &StackName,
        token: &str,
    ) -> Result<StackOutput>;
}
