//! Key/value configuration store abstraction.

use async_trait::async_trait;

use crate::Result;

/// Trait for the store that holds persisted run state.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
