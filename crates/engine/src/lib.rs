//! `engine` crate: flow models, validation, and the execution engine.

pub mod models;
pub mod error;
pub mod validate;
pub mod executor;

pub use models::{Flow, TaskDefinition};
pub use error::EngineError;
pub use validate::validate_flow;
pub use executor::{ExecutionResult, FlowExecutor, NodeRegistry};
