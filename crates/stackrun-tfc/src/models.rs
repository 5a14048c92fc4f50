//! JSON:API payloads used by the client.

use serde::{Deserialize, Serialize};

/// Body of a workspace creation request.
#[derive(Debug, Serialize)]
pub struct CreateWorkspaceRequest {
    pub data: CreateWorkspaceData,
}

#[derive(Debug, Serialize)]
pub struct CreateWorkspaceData {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: CreateWorkspaceAttributes,
}

#[derive(Debug, Serialize)]
pub struct CreateWorkspaceAttributes {
    pub name: String,
    /// Plans run wherever the deploy tool runs; the workspace only holds state.
    #[serde(rename = "execution-mode")]
    pub execution_mode: &'static str,
}

impl CreateWorkspaceRequest {
    pub fn new(name: &str) -> Self {
        Self {
            data: CreateWorkspaceData {
                kind: "workspaces",
                attributes: CreateWorkspaceAttributes {
                    name: name.to_string(),
                    execution_mode: "local",
                },
            },
        }
    }
}

/// Response of a workspace lookup; only the id is used.
#[derive(Debug, Deserialize)]
pub struct WorkspaceResponse {
    pub data: WorkspaceData,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceData {
    pub id: String,
}

/// One page of current state version outputs.
#[derive(Debug, Deserialize)]
pub struct OutputsPage {
    #[serde(default)]
    pub data: Vec<OutputData>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct OutputData {
    pub attributes: OutputAttributes,
}

#[derive(Debug, Deserialize)]
pub struct OutputAttributes {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(rename = "next-page")]
    pub next_page: Option<u32>,
}

impl OutputsPage {
    pub fn next_page(&self) -> Option<u32> {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .and_then(|p| p.next_page)
    }
}

/// JSON:API error document.
#[derive(Debug, Deserialize)]
pub struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorObject {
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl ErrorDocument {
    /// Human-readable summary of every error object.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| match (&e.title, &e.detail) {
                (Some(title), Some(detail)) => format!("{}: {}", title, detail),
                (Some(title), None) => title.clone(),
                (None, Some(detail)) => detail.clone(),
                (None, None) => "unknown error".to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
