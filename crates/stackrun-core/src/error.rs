//! Error types for stackrun.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown environment '{0}', expected one of <dev|stg|prd|all>")]
    UnknownEnvironment(String),

    #[error("stack set is empty")]
    EmptyStackSet,

    #[error("duplicate stack in stack set: {0}")]
    DuplicateStack(String),

    #[error("workspace api error: {0}")]
    Workspace(String),

    #[error("config store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
