//! Run configuration.
//!
//! Every input of a run is collected into a [`RunConfig`] once, at startup,
//! and passed by reference into the components. Nothing below the binary
//! reads process environment variables.

use crate::{ConfigError, ConfigResult, DeployToolConfig};
use stackrun_core::{DeploySpec, Environment, StackName, StackSet, derive_state_key};
use std::collections::BTreeMap;

pub const DEFAULT_STACK_TYPE: &str = "do-k8s";
pub const DEFAULT_TEAM: &str = "private";
pub const DEFAULT_REPO: &str = "sample-app";
pub const DEFAULT_TAG: &str = "main";
pub const DEFAULT_TFC_ADDRESS: &str = "https://app.terraform.io";

/// Immutable inputs of one orchestrator run.
#[derive(Clone)]
pub struct RunConfig {
    environment: Environment,
    stack_type: String,
    team: String,
    repo: String,
    tag: String,
    organization: String,
    token: String,
    tfc_address: String,
    deploy: DeployToolConfig,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("environment", &self.environment)
            .field("stack_type", &self.stack_type)
            .field("team", &self.team)
            .field("repo", &self.repo)
            .field("tag", &self.tag)
            .field("organization", &self.organization)
            .field("token", &"<redacted>")
            .field("tfc_address", &self.tfc_address)
            .field("deploy", &self.deploy)
            .finish()
    }
}

impl RunConfig {
    pub fn builder(environment: Environment) -> RunConfigBuilder {
        RunConfigBuilder::new(environment)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn stack_type(&self) -> &str {
        &self.stack_type
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn tfc_address(&self) -> &str {
        &self.tfc_address
    }

    pub fn deploy(&self) -> &DeployToolConfig {
        &self.deploy
    }

    /// Stacks selected by this run, in deploy order.
    pub fn stack_set(&self) -> stackrun_core::Result<StackSet> {
        StackSet::resolve(self.environment, &self.stack_type, &self.repo)
    }

    /// Config-store key the aggregate state is published under.
    pub fn state_key(&self) -> String {
        derive_state_key(self.environment.as_str(), &self.stack_type)
    }

    /// Console page listing the organization's workspaces.
    pub fn workspaces_url(&self) -> String {
        format!(
            "{}/app/{}/workspaces/",
            self.tfc_address.trim_end_matches('/'),
            self.organization
        )
    }

    /// Build the deploy spec for one stack.
    pub fn deploy_spec(&self, stack: &StackName) -> DeploySpec {
        let mut args = vec![
            "deploy".to_string(),
            stack.to_string(),
            "--auto-approve".to_string(),
        ];
        args.extend(self.deploy.extra_args.iter().cloned());

        let mut env: BTreeMap<String, String> = self.deploy.env.clone();
        env.insert("CDKTF_LOG_LEVEL".to_string(), self.deploy.log_level.clone());
        env.insert("STACK_ENV".to_string(), self.environment.to_string());
        env.insert("STACK_TYPE".to_string(), self.stack_type.clone());
        env.insert("STACK_REPO".to_string(), self.repo.clone());
        env.insert("STACK_TAG".to_string(), self.tag.clone());

        DeploySpec {
            stack: stack.clone(),
            command: self.deploy.command.clone(),
            args,
            env,
        }
    }

    /// Build deploy specs for every stack in `stacks`, preserving order.
    pub fn deploy_specs(&self, stacks: &StackSet) -> Vec<DeploySpec> {
        stacks.iter().map(|stack| self.deploy_spec(stack)).collect()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    environment: Environment,
    stack_type: String,
    team: String,
    repo: String,
    tag: String,
    organization: String,
    token: String,
    tfc_address: String,
    deploy: DeployToolConfig,
}

impl RunConfigBuilder {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            stack_type: DEFAULT_STACK_TYPE.to_string(),
            team: DEFAULT_TEAM.to_string(),
            repo: DEFAULT_REPO.to_string(),
            tag: DEFAULT_TAG.to_string(),
            organization: String::new(),
            token: String::new(),
            tfc_address: DEFAULT_TFC_ADDRESS.to_string(),
            deploy: DeployToolConfig::default(),
        }
    }

    pub fn with_stack_type(mut self, stack_type: impl Into<String>) -> Self {
        self.stack_type = stack_type.into();
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_tfc_address(mut self, address: impl Into<String>) -> Self {
        self.tfc_address = address.into();
        self
    }

    pub fn with_deploy(mut self, deploy: DeployToolConfig) -> Self {
        self.deploy = deploy;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> ConfigResult<RunConfig> {
        for (field, value) in [
            ("stack type", &self.stack_type),
            ("repo", &self.repo),
            ("tag", &self.tag),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }

        Ok(RunConfig {
            environment: self.environment,
            stack_type: self.stack_type.trim().to_string(),
            team: self.team,
            repo: self.repo.trim().to_string(),
            tag: self.tag.trim().to_string(),
            organization: self.organization,
            token: self.token,
            tfc_address: self.tfc_address,
            deploy: self.deploy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> RunConfig {
        RunConfig::builder(Environment::Dev)
            .with_organization("acme")
            .with_token("secret-token")
            .with_tag("v1.2.0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::builder(Environment::Stg).build().unwrap();
        assert_eq!(config.stack_type(), "do-k8s");
        assert_eq!(config.team(), "private");
        assert_eq!(config.repo(), "sample-app");
        assert_eq!(config.tag(), "main");
        assert_eq!(config.state_key(), "STG_DO_K8S_STATE");
    }

    #[test]
    fn test_deploy_spec_env_and_args() {
        let config = dev_config();
        let stacks = config.stack_set().unwrap();
        let specs = config.deploy_specs(&stacks);

        assert_eq!(specs.len(), 3);
        let spec = &specs[2];
        assert_eq!(spec.stack.as_str(), "dev-sample-app-do-k8s");
        assert_eq!(spec.command, "./node_modules/.bin/cdktf");
        assert_eq!(spec.args, vec!["deploy", "dev-sample-app-do-k8s", "--auto-approve"]);
        assert_eq!(spec.env["CDKTF_LOG_LEVEL"], "fatal");
        assert_eq!(spec.env["STACK_ENV"], "dev");
        assert_eq!(spec.env["STACK_TYPE"], "do-k8s");
        assert_eq!(spec.env["STACK_REPO"], "sample-app");
        assert_eq!(spec.env["STACK_TAG"], "v1.2.0");
    }

    #[test]
    fn test_run_values_override_configured_env() {
        let mut deploy = DeployToolConfig::default();
        deploy.env.insert("STACK_TAG".to_string(), "ignored".to_string());
        deploy.env.insert("TF_IN_AUTOMATION".to_string(), "1".to_string());
        deploy.extra_args.push("--parallelism=2".to_string());

        let config = RunConfig::builder(Environment::Prd)
            .with_deploy(deploy)
            .build()
            .unwrap();
        let spec = config.deploy_spec(&StackName::registry("do-k8s"));

        assert_eq!(spec.env["STACK_TAG"], "main");
        assert_eq!(spec.env["TF_IN_AUTOMATION"], "1");
        assert_eq!(spec.args.last().map(String::as_str), Some("--parallelism=2"));
    }

    #[test]
    fn test_workspaces_url() {
        let config = RunConfig::builder(Environment::Dev)
            .with_organization("acme")
            .with_tfc_address("https://tfe.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.workspaces_url(), "https://tfe.example.com/app/acme/workspaces/");
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", dev_config());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_empty_stack_type_rejected() {
        let result = RunConfig::builder(Environment::Dev).with_stack_type("  ").build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
