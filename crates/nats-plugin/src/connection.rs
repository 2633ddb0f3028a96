//! Connection provider seam and its `async-nats` implementation.

use std::time::Duration;

use async_nats::client::RequestErrorKind;
use async_nats::ConnectOptions;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::{ConnectionConfig, OutboundMessage, RequestError};

/// Result of one request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A responder answered with this body.
    Message(Bytes),
    /// Nobody answered within the timeout.
    TimedOut,
    /// The server reported that no one subscribes to the subject.
    NoResponders,
}

/// A live connection, owned by exactly one task invocation.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send `message` and wait at most `timeout` for a single reply.
    async fn request(&self, message: OutboundMessage, timeout: Duration) -> Result<Reply, RequestError>;

    /// Drain pending traffic and shut the connection down.
    ///
    /// Callers bound this with their own timeout; an implementation may wait
    /// on an unreachable server.
    async fn close(&self) -> Result<(), RequestError>;
}

/// Opens connections from task configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, RequestError>;
}

// ---------------------------------------------------------------------------
// NatsConnector
// ---------------------------------------------------------------------------

/// Connector backed by the `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsConnector {
    /// Client name reported to the server.
    pub client_name: String,
    /// Upper bound on establishing the TCP/TLS session.
    pub connect_timeout: Duration,
}

impl Default for NatsConnector {
    fn default() -> Self {
        Self {
            client_name: "nats-request-task".to_owned(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl Connector for NatsConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, RequestError> {
        let mut options = match &config.creds {
            Some(creds) => ConnectOptions::with_credentials(creds)
                .map_err(|e| RequestError::Connection(format!("invalid credentials: {e}")))?,
            None => ConnectOptions::new(),
        };
        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            options = options.user_and_password(user.clone(), password.clone());
        }
        if let Some(token) = &config.token {
            options = options.token(token.clone());
        }

        let client = options
            .name(&self.client_name)
            .connection_timeout(self.connect_timeout)
            .connect(config.url.as_str())
            .await
            .map_err(|e| RequestError::Connection(format!("{}: {e}", config.url)))?;

        info!("connected to NATS at {}", config.url);
        Ok(Box::new(NatsConnection { client }))
    }
}

/// One `async-nats` client. Dropping it tears down the connection.
struct NatsConnection {
    client: async_nats::Client,
}

#[async_trait]
impl Connection for NatsConnection {
    async fn request(&self, message: OutboundMessage, timeout: Duration) -> Result<Reply, RequestError> {
        let mut request = async_nats::client::Request::new()
            .payload(message.payload.clone())
            .timeout(Some(timeout));
        if !message.headers.is_empty() {
            request = request.headers(message.header_map());
        }

        match self.client.send_request(message.subject, request).await {
            Ok(reply) => Ok(Reply::Message(reply.payload)),
            Err(e) => match e.kind() {
                RequestErrorKind::TimedOut => Ok(Reply::TimedOut),
                RequestErrorKind::NoResponders => Ok(Reply::NoResponders),
                _ => Err(RequestError::Transport(e.to_string())),
            },
        }
    }

    async fn close(&self) -> Result<(), RequestError> {
        debug!("draining NATS connection");
        self.client
            .drain()
            .await
            .map_err(|e| RequestError::Transport(format!("drain on close failed: {e}")))
    }
}
