//! `MockNode`: a test double for `ExecutableNode`.
//!
//! Useful in engine tests where a real task implementation (and a live NATS
//! server) is either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::{ExecutableNode, ExecutionContext, NodeError};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Render the string found under this config key and return it as
    /// `{"rendered": ...}`.
    RenderField(String),
    /// Fail with a `Fatal` error.
    FailFatal(String),
}

/// A mock node that records every config it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// All configs seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given value.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that renders one templated config field.
    pub fn rendering(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::RenderField(field.into()))
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::FailFatal(msg.into()))
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.calls.lock().unwrap().push(config.clone());

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => {
                // Tag the output with the node's name so tests can trace which
                // node produced it.
                let mut out = json!({ "node": self.name });
                if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), v.as_object()) {
                    for (k, val) in v_obj {
                        out_obj.insert(k.clone(), val.clone());
                    }
                }
                Ok(out)
            }
            MockBehaviour::RenderField(field) => {
                let template = config
                    .get(field)
                    .and_then(Value::as_str)
                    .ok_or_else(|| NodeError::InvalidConfig(format!("missing '{field}'")))?;
                let rendered = ctx
                    .render(template)
                    .map_err(|e| NodeError::Fatal(e.to_string()))?;
                Ok(json!({ "rendered": rendered }))
            }
            MockBehaviour::FailFatal(msg) => Err(NodeError::Fatal(msg.clone())),
        }
    }
}
