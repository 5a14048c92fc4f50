//! Aggregate state persistence.

use crate::PublishError;
use stackrun_core::{AggregateState, ConfigStore};
use std::sync::Arc;
use tracing::info;

/// Writes aggregate state to the config store.
pub struct StatePublisher {
    store: Arc<dyn ConfigStore>,
}

impl StatePublisher {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Serialize `state` and store it under `key`, replacing any previous value.
    pub async fn publish(&self, key: &str, state: &AggregateState) -> Result<(), PublishError> {
        let value = state.to_json().map_err(|e| PublishError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        self.store
            .set(key, &value)
            .await
            .map_err(|e| PublishError {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        info!(key = %key, outputs = state.len(), "Published aggregate state");
        Ok(())
    }

    /// State published by a previous run, if any.
    pub async fn previous(&self, key: &str) -> stackrun_core::Result<Option<AggregateState>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(AggregateState::from_json(&raw)?)),
            None => Ok(None),
        }
    }
}
