//! Deploy tool settings.
//!
//! The deploy tool defaults to the project-local cdktf binary. A `stackrun.kdl`
//! file can override it:
//!
//! ```kdl
//! deploy {
//!     command "./node_modules/.bin/cdktf"
//!     log-level "fatal"
//!     args "--parallelism=10"
//!     env {
//!         TF_IN_AUTOMATION "1"
//!     }
//! }
//! ```

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_DEPLOY_COMMAND: &str = "./node_modules/.bin/cdktf";
pub const DEFAULT_LOG_LEVEL: &str = "fatal";

/// How the external deploy tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployToolConfig {
    /// Deploy tool binary.
    pub command: String,
    /// Value passed to the tool as `CDKTF_LOG_LEVEL`.
    pub log_level: String,
    /// Arguments appended after `deploy <stack> --auto-approve`.
    pub extra_args: Vec<String>,
    /// Extra environment variables for every deploy process.
    pub env: BTreeMap<String, String>,
}

impl Default for DeployToolConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_DEPLOY_COMMAND.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            extra_args: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

/// Parse deploy tool settings from KDL text. Missing fields keep their defaults.
pub fn parse_deploy_config(kdl: &str) -> ConfigResult<DeployToolConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = DeployToolConfig::default();

    for node in doc.nodes() {
        if node.name().value() == "deploy" {
            apply_deploy_node(node, &mut config)?;
        }
    }

    Ok(config)
}

/// Read and parse a deploy settings file.
pub fn load_deploy_config(path: &Path) -> ConfigResult<DeployToolConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_deploy_config(&content)
}

fn apply_deploy_node(node: &KdlNode, config: &mut DeployToolConfig) -> ConfigResult<()> {
    let Some(children) = node.children() else {
        return Ok(());
    };

    for child in children.nodes() {
        match child.name().value() {
            "command" => {
                let command = get_first_string_arg(child)
                    .ok_or_else(|| ConfigError::MissingField("deploy command".to_string()))?;
                if command.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "deploy command".to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
                config.command = command;
            }
            "log-level" | "log_level" => {
                config.log_level = get_first_string_arg(child)
                    .ok_or_else(|| ConfigError::MissingField("deploy log-level".to_string()))?;
            }
            "args" => {
                config.extra_args.extend(get_all_string_args(child));
            }
            "env" => {
                if let Some(vars) = child.children() {
                    for var in vars.nodes() {
                        let key = var.name().value().to_string();
                        let value = get_first_string_arg(var).ok_or_else(|| {
                            ConfigError::InvalidValue {
                                field: format!("deploy env {}", key),
                                message: "expected a string value".to_string(),
                            }
                        })?;
                        config.env.insert(key, value);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_deploy_config("").unwrap();
        assert_eq!(config, DeployToolConfig::default());
        assert_eq!(config.command, "./node_modules/.bin/cdktf");
        assert_eq!(config.log_level, "fatal");
    }

    #[test]
    fn test_parse_full_deploy_block() {
        let kdl = r#"
            deploy {
                command "npx"
                log-level "debug"
                args "cdktf" "--parallelism=4"
                env {
                    TF_IN_AUTOMATION "1"
                    HOME "/home/ops"
                }
            }
        "#;

        let config = parse_deploy_config(kdl).unwrap();
        assert_eq!(config.command, "npx");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.extra_args, vec!["cdktf", "--parallelism=4"]);
        assert_eq!(config.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
        assert_eq!(config.env.len(), 2);
    }

    #[test]
    fn test_unknown_nodes_are_ignored() {
        let kdl = r#"
            project "demo"
            deploy {
                retries "3"
            }
        "#;
        assert_eq!(parse_deploy_config(kdl).unwrap(), DeployToolConfig::default());
    }

    #[test]
    fn test_empty_command_rejected() {
        let kdl = r#"
            deploy {
                command ""
            }
        "#;
        assert!(matches!(
            parse_deploy_config(kdl),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_kdl() {
        assert!(matches!(
            parse_deploy_config("deploy {"),
            Err(ConfigError::Parse(_))
        ));
    }
}
