//! Node-level error types.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// The engine never retries a node; both variants abort the execution.
/// They differ only in what went wrong:
/// - `InvalidConfig`: the task's configuration block could not be read.
/// - `Fatal`: the task ran and failed.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// The configuration did not deserialize into the task's properties.
    #[error("invalid task configuration: {0}")]
    InvalidConfig(String),

    /// Permanent failure while running the task.
    #[error("fatal node error: {0}")]
    Fatal(String),
}

/// Failure to substitute placeholders in a templated property.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The placeholder names a variable that is not in scope.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

/// Failure to read an artifact from internal storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The URI does not use the internal storage scheme.
    #[error("unsupported storage scheme '{0}'")]
    UnsupportedScheme(String),

    /// The URI path escapes the storage root or is empty.
    #[error("invalid storage path '{0}'")]
    InvalidPath(String),

    /// Nothing is stored under this URI.
    #[error("file not found in storage: {0}")]
    NotFound(String),

    #[error("unable to read '{uri}' from storage: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}
