//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the flow engine (parsing, validation, execution).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Validation errors ------

    /// The YAML source is not a well-formed flow.
    #[error("invalid flow definition: {0}")]
    InvalidFlow(String),

    /// The flow has no tasks to run.
    #[error("flow '{0}' has no tasks")]
    EmptyFlow(String),

    /// Two or more tasks share the same ID.
    #[error("duplicate task ID: '{0}'")]
    DuplicateTaskId(String),

    /// No implementation is registered for the task's type.
    #[error("task '{task_id}' has unknown type '{task_type}'")]
    UnknownTaskType {
        task_id: String,
        task_type: String,
    },

    // ------ Execution errors ------

    /// The task's properties were rejected by its implementation.
    #[error("task '{task_id}' has invalid configuration: {message}")]
    InvalidTaskConfig {
        task_id: String,
        message: String,
    },

    /// A task failed; the whole execution is aborted.
    #[error("task '{task_id}' failed: {message}")]
    TaskFailed {
        task_id: String,
        message: String,
    },
}
