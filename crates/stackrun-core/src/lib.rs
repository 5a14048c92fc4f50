//! Core domain types and traits for the stackrun deployment orchestrator.
//!
//! This crate contains:
//! - Stack naming rules and stack-set resolution
//! - Deploy specifications and the process runner trait
//! - Workspace API and config store traits
//! - Output aggregation types

pub mod deploy;
pub mod error;
pub mod id;
pub mod output;
pub mod stack;
pub mod store;
pub mod workspace;

pub use deploy::{DeploySpec, ProcessOutcome, ProcessRunner};
pub use error::{Error, Result};
pub use id::RunId;
pub use output::{AggregateState, StackOutput};
pub use stack::{Environment, StackName, StackSet, derive_state_key};
pub use store::ConfigStore;
pub use workspace::{WorkspaceApi, WorkspaceProvisionResult};
