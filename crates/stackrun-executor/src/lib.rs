//! Deploy process execution for stackrun.
//!
//! Provides:
//! - A local process runner that spawns the deploy tool with inherited stdio
//! - The sequential executor that deploys stacks one at a time

pub mod error;
pub mod process;
pub mod sequential;

pub use error::ExecutorError;
pub use process::LocalProcessRunner;
pub use sequential::{ExecutionEvent, SequentialExecutor};
pub use stackrun_core::deploy::{DeploySpec, ProcessOutcome, ProcessRunner};
