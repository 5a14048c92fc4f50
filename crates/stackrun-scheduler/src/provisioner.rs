//! Best-effort workspace provisioning.
//!
//! Workspaces usually exist already on every run after the first, so a
//! failure for one stack is recorded and the next stack is still attempted.

use serde::Serialize;
use stackrun_core::{StackName, StackSet, WorkspaceApi, WorkspaceProvisionResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Results of provisioning every stack in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    pub results: Vec<WorkspaceProvisionResult>,
}

impl ProvisionReport {
    pub fn failures(&self) -> impl Iterator<Item = &WorkspaceProvisionResult> {
        self.results.iter().filter(|r| !r.ok)
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.ok)
    }

    /// Operator-facing summary of the failed stacks, `None` when all succeeded.
    pub fn diagnostic(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }

        let mut lines = vec![
            "The workspace backend returned at least one error for your stacks".to_string(),
            " - If this is your first run and workspaces have not been created, you may need to set a TFC_TOKEN secret".to_string(),
            " - If this is not your first run and workspaces exist, you can safely ignore this".to_string(),
            "   Details...".to_string(),
        ];
        for failure in self.failures() {
            lines.push(format!(
                "   - {}: {}",
                failure.stack,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
        Some(lines.join("\n"))
    }
}

/// Ensures a remote workspace exists for each stack.
pub struct WorkspaceProvisioner {
    api: Arc<dyn WorkspaceApi>,
}

impl WorkspaceProvisioner {
    pub fn new(api: Arc<dyn WorkspaceApi>) -> Self {
        Self { api }
    }

    /// Ensure the workspace for one stack exists. Never fails; errors are
    /// carried in the result.
    pub async fn ensure_workspace(
        &self,
        org: &str,
        stack: &StackName,
        token: &str,
    ) -> WorkspaceProvisionResult {
        info!(org = %org, stack = %stack, "Setting up workspace");
        match self.api.create_workspace(org, stack, token).await {
            Ok(()) => WorkspaceProvisionResult::created(stack.clone()),
            Err(e) => {
                warn!(stack = %stack, error = %e, "Workspace setup failed");
                WorkspaceProvisionResult::failed(stack.clone(), e.to_string())
            }
        }
    }

    /// Provision every stack in order, reporting each attempt on `events`.
    pub async fn provision_all<E>(
        &self,
        org: &str,
        stacks: &StackSet,
        token: &str,
        events: Option<&mpsc::Sender<E>>,
    ) -> ProvisionReport
    where
        E: From<WorkspaceProvisionResult> + Send,
    {
        let mut report = ProvisionReport::default();
        for stack in stacks {
            let result = self.ensure_workspace(org, stack, token).await;
            if let Some(tx) = events {
                let _ = tx.send(E::from(result.clone())).await;
            }
            report.results.push(result);
        }
        report
    }
}
