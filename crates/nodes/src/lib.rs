//! `nodes` crate: the `ExecutableNode` trait and the runtime collaborators
//! every task implementation can lean on.
//!
//! Every task type (the NATS request task included) must implement
//! [`ExecutableNode`]. The engine crate dispatches execution through this
//! trait object and hands each task an [`ExecutionContext`] that exposes
//! template rendering and internal storage.

pub mod error;
pub mod traits;
pub mod render;
pub mod storage;
pub mod mock;

pub use error::{NodeError, RenderError, StorageError};
pub use traits::{ExecutableNode, ExecutionContext};
pub use render::{TemplateRenderer, VariableRenderer};
pub use storage::{storage_key, LocalStorage, MemoryStorage, StorageAccessor, STORAGE_SCHEME};
