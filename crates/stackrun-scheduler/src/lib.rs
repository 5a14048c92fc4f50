//! Run orchestration for stackrun.
//!
//! A run moves through fixed phases: workspaces are provisioned best-effort,
//! stacks are deployed one at a time, outputs are fetched concurrently and
//! merged, and the merged state is published to the config store.

pub mod aggregator;
pub mod error;
pub mod orchestrator;
pub mod provisioner;
pub mod publisher;

pub use aggregator::OutputAggregator;
pub use error::{AggregationError, PublishError, RunError};
pub use orchestrator::{Orchestrator, RunEvent, RunPhase, RunReport};
pub use provisioner::{ProvisionReport, WorkspaceProvisioner};
pub use publisher::StatePublisher;
