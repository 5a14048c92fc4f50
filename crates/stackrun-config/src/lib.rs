//! Configuration for stackrun.
//!
//! This crate handles:
//! - The immutable run configuration built once per invocation
//! - Deploy tool settings parsed from KDL (stackrun.kdl)
//! - The JSON file that backs the config store

pub mod deploy;
pub mod error;
pub mod run;
pub mod store;

pub use deploy::{DeployToolConfig, load_deploy_config, parse_deploy_config};
pub use error::{ConfigError, ConfigResult};
pub use run::{RunConfig, RunConfigBuilder};
pub use store::FileConfigStore;
