//! `ExecutableNode` adapter so the engine can dispatch to the request task.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use nodes::{ExecutableNode, ExecutionContext, NodeError};

use crate::{Connector, NatsConnector, Request};

/// Task type under which [`RequestNode`] is registered.
pub const REQUEST_TASK_TYPE: &str = "io.kestra.plugin.nats.Request";

/// Deserializes a [`Request`] from the task config and runs it.
pub struct RequestNode {
    connector: Arc<dyn Connector>,
}

impl RequestNode {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

impl Default for RequestNode {
    fn default() -> Self {
        Self::new(Arc::new(NatsConnector::default()))
    }
}

#[async_trait]
impl ExecutableNode for RequestNode {
    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let task: Request = serde_json::from_value(config.clone())
            .map_err(|e| NodeError::InvalidConfig(e.to_string()))?;
        debug!("running {} as task '{}'", REQUEST_TASK_TYPE, ctx.task_id);

        let output = task.run(self.connector.as_ref(), ctx).await?;
        serde_json::to_value(output).map_err(|e| NodeError::Fatal(e.to_string()))
    }
}
