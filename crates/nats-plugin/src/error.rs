//! Error type for the request task.

use nodes::{NodeError, RenderError, StorageError};
use thiserror::Error;

/// Everything that can abort a request/reply cycle.
///
/// A timeout or a "no responders" status is not an error: it surfaces as an
/// empty response in the task output.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The `from` property has an unsupported shape or a bad storage URI.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The connection to the NATS server could not be established.
    #[error("unable to connect to NATS: {0}")]
    Connection(String),

    /// The server or client rejected the request itself.
    #[error("NATS request failed: {0}")]
    Transport(String),

    #[error("unable to render property: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<RequestError> for NodeError {
    fn from(err: RequestError) -> Self {
        NodeError::Fatal(err.to_string())
    }
}
