//! CLI command implementations.

pub mod deploy;

use crate::TargetArgs;
use anyhow::{Context, Result};
use stackrun_config::{DeployToolConfig, RunConfig, RunConfigBuilder, load_deploy_config};
use std::path::Path;
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "stackrun.kdl";

/// Print the resolved stacks and state key without touching anything remote.
pub fn stacks(target: TargetArgs, config_path: Option<&Path>) -> Result<()> {
    let config = builder(target, config_path)?
        .build()
        .context("Invalid run configuration")?;
    let stacks = config.stack_set().context("Failed to resolve stacks")?;

    println!("Environment: {}", config.environment());
    println!("State key:   {}", config.state_key());
    println!("Stacks:");
    for (i, spec) in config.deploy_specs(&stacks).iter().enumerate() {
        println!("  {}. {:<32} {}", i + 1, spec.stack, spec.command_line());
    }
    Ok(())
}

/// Start a run configuration from the target flags and deploy tool settings.
pub(crate) fn builder(target: TargetArgs, config_path: Option<&Path>) -> Result<RunConfigBuilder> {
    Ok(RunConfig::builder(target.environment)
        .with_stack_type(target.stack_type)
        .with_team(target.team)
        .with_repo(target.repo)
        .with_tag(target.tag)
        .with_deploy(deploy_settings(config_path)?))
}

/// Load deploy tool settings. An explicit path must exist; the default file
/// is optional.
fn deploy_settings(path: Option<&Path>) -> Result<DeployToolConfig> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    if !explicit && !path.exists() {
        return Ok(DeployToolConfig::default());
    }

    load_deploy_config(path)
        .with_context(|| format!("Failed to load deploy settings: {}", path.display()))
}

/// Validate a Terraform Cloud address and normalize it without a trailing slash.
pub(crate) fn parse_tfc_address(address: &str) -> Result<String> {
    let url = Url::parse(address).with_context(|| format!("Invalid TFC address: {}", address))?;
    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("Unsupported TFC address scheme '{}': {}", other, address),
    }
    if url.host_str().is_none() {
        anyhow::bail!("TFC address has no host: {}", address);
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackrun_core::Environment;

    fn target(environment: Environment) -> TargetArgs {
        TargetArgs {
            environment,
            stack_type: "do-k8s".to_string(),
            team: "private".to_string(),
            repo: "sample-app".to_string(),
            tag: "main".to_string(),
        }
    }

    #[test]
    fn test_parse_tfc_address() {
        assert_eq!(
            parse_tfc_address("https://app.terraform.io/").unwrap(),
            "https://app.terraform.io"
        );
        assert_eq!(
            parse_tfc_address("http://localhost:8080").unwrap(),
            "http://localhost:8080"
        );
        assert!(parse_tfc_address("app.terraform.io").is_err());
        assert!(parse_tfc_address("ftp://app.terraform.io").is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let result = builder(
            target(Environment::Dev),
            Some(Path::new("/nonexistent/stackrun.kdl")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_carries_target() {
        let mut args = target(Environment::Prd);
        args.repo = "billing".to_string();
        let config = builder(args, None).unwrap().build().unwrap();

        assert_eq!(config.environment(), Environment::Prd);
        let stacks = config.stack_set().unwrap();
        assert_eq!(stacks.stacks()[2].as_str(), "prd-billing-do-k8s");
    }
}
