//! Flow definition models.
//!
//! A flow is written in YAML: an id, a namespace and an ordered list of
//! tasks. Each task names its `type` and carries the rest of its properties
//! inline, exactly as the task implementation expects them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::EngineError;

// ---------------------------------------------------------------------------
// TaskDefinition
// ---------------------------------------------------------------------------

/// A single step in the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique identifier within this flow (referenced as `outputs.<id>`).
    pub id: String,
    /// Maps to a registered `ExecutableNode` implementation.
    #[serde(rename = "type")]
    pub task_type: String,
    /// All remaining properties, handed to the node at execution time.
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl TaskDefinition {
    /// The task's properties as a single JSON object.
    pub fn config_value(&self) -> Value {
        Value::Object(self.config.clone())
    }
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// A complete flow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub namespace: String,
    pub tasks: Vec<TaskDefinition>,
}

impl Flow {
    /// Parse a flow from its YAML source.
    pub fn from_yaml(source: &str) -> Result<Self, EngineError> {
        serde_yaml::from_str(source).map_err(|e| EngineError::InvalidFlow(e.to_string()))
    }
}
