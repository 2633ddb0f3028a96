//! Flow execution engine.
//!
//! `FlowExecutor` is the central orchestrator:
//! 1. Validates the flow against the registered task types.
//! 2. Runs the tasks in declaration order, dispatching each via `ExecutableNode`.
//! 3. Exposes every finished task's output to later tasks as
//!    `outputs.<task_id>` in their template variables.
//! 4. Aborts on the first task error; tasks are never retried.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{error, info, instrument};
use uuid::Uuid;

use nodes::{ExecutableNode, ExecutionContext, NodeError, StorageAccessor};

use crate::validate::validate_flow;
use crate::{EngineError, Flow};

// ---------------------------------------------------------------------------
// Node registry
// ---------------------------------------------------------------------------

/// Maps task `type` strings to `ExecutableNode` implementations.
pub type NodeRegistry = HashMap<String, Arc<dyn ExecutableNode>>;

// ---------------------------------------------------------------------------
// Output of a completed execution
// ---------------------------------------------------------------------------

/// The result of running a full flow.
#[derive(Debug)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    /// Each task's output, keyed by task ID, in execution order.
    pub outputs: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// FlowExecutor
// ---------------------------------------------------------------------------

/// Stateless orchestrator that runs flow executions.
///
/// Construct one executor per process and call [`FlowExecutor::run`] for
/// every execution; executions share nothing but the registry and storage.
pub struct FlowExecutor {
    registry: NodeRegistry,
    storage: Arc<dyn StorageAccessor>,
}

impl FlowExecutor {
    pub fn new(registry: NodeRegistry, storage: Arc<dyn StorageAccessor>) -> Self {
        Self { registry, storage }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Run the flow with the given inputs and return every task's output.
    ///
    /// # Errors
    /// Returns `EngineError` for validation failures, rejected task
    /// configuration, or the first failing task.
    #[instrument(skip(self, flow, inputs), fields(flow_id = %flow.id, namespace = %flow.namespace))]
    pub async fn run(
        &self,
        flow: &Flow,
        inputs: Map<String, Value>,
    ) -> Result<ExecutionResult, EngineError> {
        validate_flow(flow, &self.registry)?;

        let execution_id = Uuid::new_v4();
        info!("execution {} started with {} task(s)", execution_id, flow.tasks.len());

        let mut outputs = Map::new();

        for task in &flow.tasks {
            let node = self.registry.get(&task.task_type).ok_or_else(|| {
                EngineError::UnknownTaskType {
                    task_id: task.id.clone(),
                    task_type: task.task_type.clone(),
                }
            })?;

            let variables = json!({
                "flow": { "id": flow.id, "namespace": flow.namespace },
                "execution": { "id": execution_id.to_string() },
                "task": { "id": task.id, "type": task.task_type },
                "inputs": inputs,
                "outputs": outputs,
            });
            let ctx = ExecutionContext::new(
                &flow.id,
                execution_id,
                &task.id,
                variables,
                Arc::clone(&self.storage),
            );

            match node.execute(&task.config_value(), &ctx).await {
                Ok(output) => {
                    info!("task '{}' succeeded", task.id);
                    outputs.insert(task.id.clone(), output);
                }
                Err(err) => {
                    error!("task '{}' failed: {}", task.id, err);
                    return Err(match err {
                        NodeError::InvalidConfig(message) => EngineError::InvalidTaskConfig {
                            task_id: task.id.clone(),
                            message,
                        },
                        NodeError::Fatal(message) => EngineError::TaskFailed {
                            task_id: task.id.clone(),
                            message,
                        },
                    });
                }
            }
        }

        info!("flow '{}' execution {} succeeded", flow.id, execution_id);

        Ok(ExecutionResult { execution_id, outputs })
    }
}
