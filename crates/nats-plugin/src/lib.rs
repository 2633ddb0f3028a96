//! `nats-plugin` crate: the NATS request/reply task.
//!
//! One invocation opens a connection, renders the subject, resolves the
//! `from` property into a single message, sends it as a request and waits
//! (bounded by `requestTimeout`) for one reply. A missing reply is a normal
//! outcome and yields `{"response": null}`.
//!
//! ```yaml
//! tasks:
//!   - id: request
//!     type: io.kestra.plugin.nats.Request
//!     url: nats://localhost:4222
//!     username: nats_user
//!     password: nats_password
//!     subject: "greet.bob"
//!     from:
//!       headers:
//!         someHeaderKey: someHeaderValue
//!       data: "Hello from the flow!"
//!     requestTimeout: 2000
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod node;
pub mod payload;
pub mod request;

#[cfg(test)]
mod testing;

pub use config::ConnectionConfig;
pub use connection::{Connection, Connector, NatsConnector, Reply};
pub use error::RequestError;
pub use message::OutboundMessage;
pub use node::{RequestNode, REQUEST_TASK_TYPE};
pub use payload::{HeaderValue, MessageDescriptor, MessageSource};
pub use request::{Output, Request, DEFAULT_REQUEST_TIMEOUT};
