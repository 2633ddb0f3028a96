//! Test doubles shared by this crate's unit tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use uuid::Uuid;

use nodes::{ExecutionContext, StorageAccessor};

use crate::connection::{Connection, Connector, Reply};
use crate::{ConnectionConfig, OutboundMessage, RequestError};

pub(crate) fn context_with(variables: Value, storage: Arc<dyn StorageAccessor>) -> ExecutionContext {
    ExecutionContext::new("test-flow", Uuid::new_v4(), "request", variables, storage)
}

/// How every connection opened by a [`MockConnector`] answers requests.
#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    Respond(String),
    RespondBytes(Vec<u8>),
    Timeout,
    NoResponders,
    /// Never answers; only the caller's timeout ends the wait.
    Hang,
    Fail(String),
}

/// How connections opened by a [`MockConnector`] behave on `close`.
#[derive(Debug, Clone, Default)]
pub(crate) enum MockClose {
    #[default]
    Clean,
    Fail(String),
    /// Never finishes, like a drain against a server that went away.
    Hang,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    sent: Mutex<Vec<OutboundMessage>>,
}

/// Connector that records every connection and message.
pub(crate) struct MockConnector {
    reply: Option<MockReply>,
    close: MockClose,
    counters: Arc<Counters>,
}

impl MockConnector {
    pub(crate) fn new(reply: MockReply) -> Self {
        Self {
            reply: Some(reply),
            close: MockClose::Clean,
            counters: Arc::default(),
        }
    }

    pub(crate) fn with_close(mut self, close: MockClose) -> Self {
        self.close = close;
        self
    }

    /// A connector whose server is unreachable.
    pub(crate) fn refusing() -> Self {
        Self {
            reply: None,
            close: MockClose::Clean,
            counters: Arc::default(),
        }
    }

    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.counters.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, RequestError> {
        let reply = self
            .reply
            .clone()
            .ok_or_else(|| RequestError::Connection(format!("{}: connection refused", config.url)))?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            reply,
            close: self.close.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockConnection {
    reply: MockReply,
    close: MockClose,
    counters: Arc<Counters>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn request(&self, message: OutboundMessage, _timeout: Duration) -> Result<Reply, RequestError> {
        self.counters.sent.lock().unwrap().push(message);
        match &self.reply {
            MockReply::Respond(body) => Ok(Reply::Message(Bytes::from(body.clone()))),
            MockReply::RespondBytes(body) => Ok(Reply::Message(Bytes::from(body.clone()))),
            MockReply::Timeout => Ok(Reply::TimedOut),
            MockReply::NoResponders => Ok(Reply::NoResponders),
            MockReply::Hang => std::future::pending().await,
            MockReply::Fail(msg) => Err(RequestError::Transport(msg.clone())),
        }
    }

    async fn close(&self) -> Result<(), RequestError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        match &self.close {
            MockClose::Clean => Ok(()),
            MockClose::Fail(msg) => Err(RequestError::Transport(msg.clone())),
            MockClose::Hang => std::future::pending().await,
        }
    }
}

/// Collects formatted log lines for the current thread's subscriber.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route events to this capture until the guard is dropped.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
