//! The `ExecutableNode` trait: the contract every task type must fulfil.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{NodeError, RenderError, StorageAccessor, TemplateRenderer, VariableRenderer};

/// Shared context passed to every node during execution.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Clone)]
pub struct ExecutionContext {
    /// ID of the flow being executed.
    pub flow_id: String,
    /// ID of the current execution run.
    pub execution_id: Uuid,
    /// ID of the task this context was built for.
    pub task_id: String,
    /// Variables visible to templated properties (`inputs`, `outputs`, ...).
    pub variables: Value,
    renderer: Arc<dyn TemplateRenderer>,
    storage: Arc<dyn StorageAccessor>,
}

impl ExecutionContext {
    /// Build a context that renders with the shared [`VariableRenderer`].
    pub fn new(
        flow_id: impl Into<String>,
        execution_id: Uuid,
        task_id: impl Into<String>,
        variables: Value,
        storage: Arc<dyn StorageAccessor>,
    ) -> Self {
        Self {
            flow_id: flow_id.into(),
            execution_id,
            task_id: task_id.into(),
            variables,
            renderer: VariableRenderer::shared(),
            storage,
        }
    }

    /// Swap the template renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Substitute every placeholder in `template` using this context's variables.
    pub fn render(&self, template: &str) -> Result<String, RenderError> {
        self.renderer.render(template, &self.variables)
    }

    /// Internal storage for `kestra://` artifacts.
    pub fn storage(&self) -> &dyn StorageAccessor {
        self.storage.as_ref()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("flow_id", &self.flow_id)
            .field("execution_id", &self.execution_id)
            .field("task_id", &self.task_id)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

/// The core node trait.
///
/// All built-in task types implement this.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node with its raw `config` block (as written in the flow)
    /// and return this node's JSON output.
    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError>;
}
