//! The request/reply task: one connection, one message, at most one reply.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use nodes::ExecutionContext;

use crate::connection::{Connection, Connector, Reply};
use crate::payload::{self, MessageSource};
use crate::{ConnectionConfig, OutboundMessage, RequestError};

/// Wait applied when `requestTimeout` is not set.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Upper bound on draining the connection once the exchange is over.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

/// Send a request to a NATS subject and wait for a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    /// Subject to send the request to (templated).
    pub subject: String,
    /// Source of the message: a string, a `kestra://` URI, a
    /// `{headers, data}` map or a single-item list holding such a map.
    pub from: MessageSource,
    /// How long to wait for the reply.
    #[serde(default = "default_request_timeout", with = "crate::config::duration")]
    pub request_timeout: Duration,
}

/// What the task hands back to the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Reply body, or `None` if nobody answered in time.
    pub response: Option<String>,
}

impl Request {
    /// Run one request/reply cycle.
    ///
    /// Once the connection is open it is closed again on every exit path,
    /// including render, payload and transport failures.
    #[instrument(
        skip_all,
        fields(task_id = %ctx.task_id, url = %self.connection.url, subject = %self.subject)
    )]
    pub async fn run(
        &self,
        connector: &dyn Connector,
        ctx: &ExecutionContext,
    ) -> Result<Output, RequestError> {
        let connection = connector.connect(&self.connection).await?;
        debug!("state: Connected");

        let outcome = self.exchange(connection.as_ref(), ctx).await;

        match tokio::time::timeout(CLOSE_TIMEOUT, connection.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("connection did not close cleanly: {e}"),
            Err(_elapsed) => warn!("connection did not close within {CLOSE_TIMEOUT:?}, dropping it"),
        }
        drop(connection);
        debug!("state: Closed");

        match &outcome {
            Ok(output) => info!(replied = output.response.is_some(), "request finished"),
            Err(e) => warn!("request failed: {e}"),
        }
        outcome
    }

    async fn exchange(
        &self,
        connection: &dyn Connection,
        ctx: &ExecutionContext,
    ) -> Result<Output, RequestError> {
        let subject = ctx.render(&self.subject)?;
        debug!("state: SubjectRendered ({subject})");

        let descriptor = payload::resolve(&self.from, ctx).await?;
        let message = OutboundMessage::build(subject, descriptor);
        debug!(
            "state: MessageBuilt ({} header(s), {} byte(s))",
            message.headers.len(),
            message.payload.len()
        );

        debug!("state: AwaitingReply (timeout {:?})", self.request_timeout);
        let reply = match tokio::time::timeout(
            self.request_timeout,
            connection.request(message, self.request_timeout),
        )
        .await
        {
            Ok(reply) => reply?,
            Err(_elapsed) => Reply::TimedOut,
        };

        let response = match reply {
            Reply::Message(body) => {
                debug!("state: RepliedOK");
                Some(String::from_utf8_lossy(&body).into_owned())
            }
            Reply::TimedOut => {
                warn!("no reply within {:?}", self.request_timeout);
                None
            }
            Reply::NoResponders => {
                warn!("no responders on subject");
                None
            }
        };
        Ok(Output { response })
    }
}
