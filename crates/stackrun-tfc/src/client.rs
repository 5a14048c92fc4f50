//! Terraform Cloud API client.

use crate::TfcError;
use crate::models::{CreateWorkspaceRequest, ErrorDocument, OutputsPage, WorkspaceResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use stackrun_core::{StackName, StackOutput, WorkspaceApi};
use tracing::{debug, info, warn};

const CONTENT_TYPE: &str = "application/vnd.api+json";
const OUTPUTS_PAGE_SIZE: u32 = 100;

/// Client for the Terraform Cloud v2 API.
pub struct TfcClient {
    client: reqwest::Client,
    base_url: String,
}

impl TfcClient {
    /// Create a client for the given address, e.g. `https://app.terraform.io`.
    pub fn new(address: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: address.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(client: reqwest::Client, address: &str) -> Self {
        Self {
            client,
            base_url: address.trim_end_matches('/').to_string(),
        }
    }

    fn workspaces_url(&self, org: &str) -> String {
        format!(
            "{}/api/v2/organizations/{}/workspaces",
            self.base_url,
            urlencoding::encode(org)
        )
    }

    fn workspace_url(&self, org: &str, name: &str) -> String {
        format!("{}/{}", self.workspaces_url(org), urlencoding::encode(name))
    }

    fn outputs_url(&self, workspace_id: &str, page: u32) -> String {
        format!(
            "{}/api/v2/workspaces/{}/current-state-version-outputs?page%5Bnumber%5D={}&page%5Bsize%5D={}",
            self.base_url,
            urlencoding::encode(workspace_id),
            page,
            OUTPUTS_PAGE_SIZE
        )
    }

    /// Create a workspace. An existing workspace yields [`TfcError::AlreadyExists`].
    pub async fn create(&self, org: &str, name: &str, token: &str) -> Result<(), TfcError> {
        let token = require_token(token)?;

        let response = self
            .client
            .post(self.workspaces_url(org))
            .bearer_auth(token)
            .header("Content-Type", CONTENT_TYPE)
            .json(&CreateWorkspaceRequest::new(name))
            .send()
            .await
            .map_err(|e| TfcError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(org = %org, workspace = %name, "Created workspace");
            return Ok(());
        }

        let text = error_body(response).await?;
        Err(create_error(status, name, &text))
    }

    /// Look up a workspace id by name.
    pub async fn workspace_id(
        &self,
        org: &str,
        name: &str,
        token: &str,
    ) -> Result<String, TfcError> {
        let token = require_token(token)?;

        let response = self
            .client
            .get(self.workspace_url(org, name))
            .bearer_auth(token)
            .header("Content-Type", CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| TfcError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = error_body(response).await?;
            return Err(api_error(status, &text));
        }

        let workspace: WorkspaceResponse = response
            .json()
            .await
            .map_err(|e| TfcError::Parse(e.to_string()))?;
        Ok(workspace.data.id)
    }

    /// Fetch all outputs of the workspace's current state version.
    pub async fn outputs(
        &self,
        org: &str,
        name: &str,
        token: &str,
    ) -> Result<StackOutput, TfcError> {
        let workspace_id = self.workspace_id(org, name, token).await?;
        let mut outputs = StackOutput::new();
        let mut page = 1;

        loop {
            let response = self
                .client
                .get(self.outputs_url(&workspace_id, page))
                .bearer_auth(token)
                .header("Content-Type", CONTENT_TYPE)
                .send()
                .await
                .map_err(|e| TfcError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = error_body(response).await?;
                return Err(api_error(status, &text));
            }

            let body: OutputsPage = response
                .json()
                .await
                .map_err(|e| TfcError::Parse(e.to_string()))?;
            let next = body.next_page();
            merge_page(&mut outputs, name, body);

            match advance_page(page, next) {
                Some(n) => page = n,
                None => break,
            }
        }

        debug!(workspace = %name, count = outputs.len(), "Fetched workspace outputs");
        Ok(outputs)
    }
}

#[async_trait]
impl WorkspaceApi for TfcClient {
    async fn create_workspace(
        &self,
        org: &str,
        stack: &StackName,
        token: &str,
    ) -> stackrun_core::Result<()> {
        match self.create(org, stack.as_str(), token).await {
            Ok(()) => Ok(()),
            Err(TfcError::AlreadyExists(name)) => {
                debug!(workspace = %name, "Workspace already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_workspace_outputs(
        &self,
        org: &str,
        stack: &StackName,
        token: &str,
    ) -> stackrun_core::Result<StackOutput> {
        Ok(self.outputs(org, stack.as_str(), token).await?)
    }
}

fn require_token(token: &str) -> Result<&str, TfcError> {
    if token.trim().is_empty() {
        return Err(TfcError::MissingToken);
    }
    Ok(token)
}

async fn error_body(response: reqwest::Response) -> Result<String, TfcError> {
    response
        .text()
        .await
        .map_err(|e| TfcError::Request(format!("failed to read error response: {}", e)))
}

/// Classify a failed workspace creation. A 422 naming the workspace as taken
/// means it already exists.
fn create_error(status: StatusCode, name: &str, body: &str) -> TfcError {
    if status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already been taken") {
        return TfcError::AlreadyExists(name.to_string());
    }
    api_error(status, body)
}

/// Next page to fetch. Stops unless the server points strictly forward.
fn advance_page(current: u32, next: Option<u32>) -> Option<u32> {
    next.filter(|n| *n > current)
}

/// Add one page of outputs. Sensitive outputs carry no readable value and are
/// left out of the result.
fn merge_page(outputs: &mut StackOutput, workspace: &str, page: OutputsPage) {
    for output in page.data {
        let attributes = output.attributes;
        if attributes.sensitive {
            warn!(
                workspace = %workspace,
                output = %attributes.name,
                "Skipping sensitive output, its value is not readable"
            );
            continue;
        }
        outputs.insert(attributes.name, attributes.value);
    }
}

fn api_error(status: StatusCode, body: &str) -> TfcError {
    let message = serde_json::from_str::<ErrorDocument>(body)
        .ok()
        .map(|doc| doc.summary())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    TfcError::Api {
        status: status.as_u16(),
        message,
    }
}
