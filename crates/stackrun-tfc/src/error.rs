//! Terraform Cloud API errors.

#[derive(Debug, thiserror::Error)]
pub enum TfcError {
    #[error("no Terraform Cloud token configured")]
    MissingToken,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("workspace {0} already exists")]
    AlreadyExists(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<TfcError> for stackrun_core::Error {
    fn from(e: TfcError) -> Self {
        stackrun_core::Error::Workspace(e.to_string())
    }
}
