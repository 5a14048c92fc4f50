//! Stack outputs and their aggregate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output values of one stack, keyed by output name.
pub type StackOutput = BTreeMap<String, serde_json::Value>;

/// Union of the outputs of every stack in a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateState(BTreeMap<String, serde_json::Value>);

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one stack's outputs; keys already present are overwritten.
    pub fn merge(&mut self, output: StackOutput) {
        self.0.extend(output);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl FromIterator<StackOutput> for AggregateState {
    fn from_iter<I: IntoIterator<Item = StackOutput>>(iter: I) -> Self {
        let mut state = Self::new();
        for output in iter {
            state.merge(output);
        }
        state
    }
}
