//! Flow validation: run this before executing a flow.
//!
//! Rules enforced:
//! 1. The flow has at least one task.
//! 2. Task IDs are unique within the flow.
//! 3. Every task type has a registered implementation.

use std::collections::HashSet;

use crate::executor::NodeRegistry;
use crate::{EngineError, Flow};

/// Validate `flow` against the registered task types.
///
/// # Errors
/// - [`EngineError::EmptyFlow`] if there is nothing to run.
/// - [`EngineError::DuplicateTaskId`] if two tasks share an ID.
/// - [`EngineError::UnknownTaskType`] if a task type is not registered.
pub fn validate_flow(flow: &Flow, registry: &NodeRegistry) -> Result<(), EngineError> {
    if flow.tasks.is_empty() {
        return Err(EngineError::EmptyFlow(flow.id.clone()));
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for task in &flow.tasks {
        if !seen_ids.insert(task.id.as_str()) {
            return Err(EngineError::DuplicateTaskId(task.id.clone()));
        }
        if !registry.contains_key(&task.task_type) {
            return Err(EngineError::UnknownTaskType {
                task_id: task.id.clone(),
                task_type: task.task_type.clone(),
            });
        }
    }

    Ok(())
}
