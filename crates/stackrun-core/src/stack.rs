//! Stack naming and stack-set resolution.
//!
//! Stacks are deployed in a fixed order: the shared registry stack first,
//! then environment stacks, then application stacks that depend on them.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{Error, Result};

/// Environment selector for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Stg,
    Prd,
    /// Every environment's stacks in one run.
    All,
}

impl Environment {
    /// Concrete environments in deploy order.
    pub const CONCRETE: [Environment; 3] = [Environment::Dev, Environment::Stg, Environment::Prd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Stg => "stg",
            Environment::Prd => "prd",
            Environment::All => "all",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Environment::Dev),
            "stg" => Ok(Environment::Stg),
            "prd" => Ok(Environment::Prd),
            "all" => Ok(Environment::All),
            _ => Err(Error::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Name of one deployable stack, e.g. `dev-sample-app-do-k8s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct StackName(String);

impl StackName {
    /// `registry-{type}`
    pub fn registry(stack_type: &str) -> Self {
        Self::compose(&["registry", stack_type])
    }

    /// `{env}-{type}`
    pub fn environment(env: Environment, stack_type: &str) -> Self {
        Self::compose(&[env.as_str(), stack_type])
    }

    /// `{env}-{repo}-{type}`
    pub fn application(env: Environment, repo: &str, stack_type: &str) -> Self {
        Self::compose(&[env.as_str(), repo, stack_type])
    }

    fn compose(parts: &[&str]) -> Self {
        let joined = parts
            .iter()
            .map(|p| p.trim())
            .collect::<Vec<_>>()
            .join("-");
        Self(joined.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StackName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, non-empty list of unique stacks selected for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSet {
    environment: Environment,
    stacks: Vec<StackName>,
}

impl StackSet {
    /// Resolve the stack table for an environment.
    pub fn resolve(environment: Environment, stack_type: &str, repo: &str) -> Result<Self> {
        if stack_type.trim().is_empty() {
            return Err(Error::InvalidInput("stack type must not be empty".to_string()));
        }
        if repo.trim().is_empty() {
            return Err(Error::InvalidInput("repo name must not be empty".to_string()));
        }

        let stacks = match environment {
            Environment::All => {
                let mut stacks = vec![StackName::registry(stack_type)];
                stacks.extend(
                    Environment::CONCRETE
                        .iter()
                        .map(|env| StackName::environment(*env, stack_type)),
                );
                stacks.extend(
                    Environment::CONCRETE
                        .iter()
                        .map(|env| StackName::application(*env, repo, stack_type)),
                );
                stacks
            }
            env => vec![
                StackName::registry(stack_type),
                StackName::environment(env, stack_type),
                StackName::application(env, repo, stack_type),
            ],
        };

        Self::from_stacks(environment, stacks)
    }

    /// Build a stack set from an explicit list, enforcing non-emptiness and uniqueness.
    pub fn from_stacks(environment: Environment, stacks: Vec<StackName>) -> Result<Self> {
        if stacks.is_empty() {
            return Err(Error::EmptyStackSet);
        }

        let mut seen = HashSet::new();
        for stack in &stacks {
            if !seen.insert(stack.as_str()) {
                return Err(Error::DuplicateStack(stack.to_string()));
            }
        }

        Ok(Self {
            environment,
            stacks,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn stacks(&self) -> &[StackName] {
        &self.stacks
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StackName> {
        self.stacks.iter()
    }
}

impl<'a> IntoIterator for &'a StackSet {
    type Item = &'a StackName;
    type IntoIter = std::slice::Iter<'a, StackName>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.iter()
    }
}

/// Config-store key for an environment's aggregate state: `{ENV}_{TYPE}_STATE`,
/// uppercased with every non-alphanumeric character folded to `_`.
pub fn derive_state_key(env: &str, stack_type: &str) -> String {
    format!("{}_{}_STATE", env, stack_type)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
