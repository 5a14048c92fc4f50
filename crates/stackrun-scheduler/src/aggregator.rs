//! Concurrent output collection.

use crate::AggregationError;
use futures::future::join_all;
use stackrun_core::{AggregateState, StackSet, WorkspaceApi};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches every stack's outputs and merges them into one state.
pub struct OutputAggregator {
    api: Arc<dyn WorkspaceApi>,
}

impl OutputAggregator {
    pub fn new(api: Arc<dyn WorkspaceApi>) -> Self {
        Self { api }
    }

    /// Fetch outputs of all stacks concurrently and merge them in stack-set
    /// order, so a later stack overwrites an earlier stack's key.
    ///
    /// Any single fetch failure fails the whole aggregation; when several
    /// fail, the earliest stack in order is reported.
    pub async fn collect_outputs(
        &self,
        org: &str,
        stacks: &StackSet,
        token: &str,
    ) -> Result<AggregateState, AggregationError> {
        let fetches = stacks.iter().map(|stack| async move {
            let result = self.api.get_workspace_outputs(org, stack, token).await;
            (stack, result)
        });

        // join_all yields results in input order regardless of completion order.
        let results = join_all(fetches).await;

        let mut state = AggregateState::new();
        for (stack, result) in results {
            let output = result.map_err(|e| AggregationError {
                stack: stack.clone(),
                message: e.to_string(),
            })?;
            debug!(stack = %stack, keys = output.len(), "Merging stack outputs");
            state.merge(output);
        }

        info!(stacks = stacks.len(), keys = state.len(), "Aggregated stack outputs");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use stackrun_core::{Environment, Error, StackName, StackOutput};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned outputs; earlier stacks respond slower so completion
    /// order is the reverse of stack order.
    struct CannedApi {
        outputs: HashMap<String, StackOutput>,
        failing: Option<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CannedApi {
        fn new(outputs: Vec<(&str, StackOutput)>) -> Self {
            Self {
                outputs: outputs
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                failing: None,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WorkspaceApi for CannedApi {
        async fn create_workspace(
            &self,
            _org: &str,
            _stack: &StackName,
            _token: &str,
        ) -> stackrun_core::Result<()> {
            Ok(())
        }

        async fn get_workspace_outputs(
            &self,
            _org: &str,
            stack: &StackName,
            _token: &str,
        ) -> stackrun_core::Result<StackOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = match stack.as_str() {
                s if s.starts_with("registry") => 40,
                s if s.contains("sample-app") => 5,
                _ => 20,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.as_deref() == Some(stack.as_str()) {
                return Err(Error::Workspace("API error (404): not found".to_string()));
            }
            Ok(self.outputs.get(stack.as_str()).cloned().unwrap_or_default())
        }
    }

    fn output(pairs: &[(&str, serde_json::Value)]) -> StackOutput {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn dev_stacks() -> StackSet {
        StackSet::resolve(Environment::Dev, "do-k8s", "sample-app").unwrap()
    }

    #[tokio::test]
    async fn test_later_stack_wins_on_collision() {
        let api = Arc::new(CannedApi::new(vec![
            ("registry-do-k8s", output(&[("registry", json!("r")), ("region", json!("nyc1"))])),
            ("dev-do-k8s", output(&[("cluster", json!({"name": "dev"})), ("region", json!("sfo3"))])),
            ("dev-sample-app-do-k8s", output(&[("app", json!("sample-app"))])),
        ]));
        let aggregator = OutputAggregator::new(api.clone());

        let state = aggregator
            .collect_outputs("acme", &dev_stacks(), "token")
            .await
            .unwrap();

        assert_eq!(state.len(), 4);
        assert_eq!(state.get("region"), Some(&json!("sfo3")));
        assert_eq!(state.get("cluster"), Some(&json!({"name": "dev"})));
        assert!(api.max_in_flight.load(Ordering::SeqCst) > 1, "fetches ran serially");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal_and_names_stack() {
        let mut api = CannedApi::new(vec![]);
        api.failing = Some("dev-do-k8s".to_string());
        let aggregator = OutputAggregator::new(Arc::new(api));

        let err = aggregator
            .collect_outputs("acme", &dev_stacks(), "token")
            .await
            .unwrap_err();
        assert_eq!(err.stack.as_str(), "dev-do-k8s");
        assert!(err.to_string().contains("dev-do-k8s"));
    }
}
