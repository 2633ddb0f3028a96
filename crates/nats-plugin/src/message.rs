//! Turning a resolved descriptor into a request message.

use async_nats::HeaderMap;
use bytes::Bytes;

use crate::payload::{stringify, HeaderValue, MessageDescriptor};

/// A request ready to hand to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    /// Header names with all their values, in input order.
    pub headers: Vec<(String, Vec<String>)>,
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Build the message for `subject` from `descriptor`.
    ///
    /// The subject is not validated here; the server rejects bad subjects.
    pub fn build(subject: impl Into<String>, descriptor: MessageDescriptor) -> Self {
        let headers = descriptor
            .headers
            .into_iter()
            .map(|(key, value)| {
                let values = match value {
                    HeaderValue::Multi(values) => values.iter().map(stringify).collect(),
                    HeaderValue::Single(value) => vec![stringify(&value)],
                };
                (key, values)
            })
            .collect();

        Self {
            subject: subject.into(),
            headers,
            payload: Bytes::from(descriptor.data.into_bytes()),
        }
    }

    /// All values attached under `key`.
    pub fn header_values(&self, key: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Headers in the client's wire representation.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, values) in &self.headers {
            for value in values {
                map.append(name.as_str(), value.as_str());
            }
        }
        map
    }
}
