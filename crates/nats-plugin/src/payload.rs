//! Resolution of the polymorphic `from` property.
//!
//! Whatever shape the flow author wrote, [`resolve`] reduces it to exactly one
//! [`MessageDescriptor`]:
//! - a plain string is the message body;
//! - a `kestra://` string is replaced by the content of the stored file;
//! - a map carries optional `headers` and `data`;
//! - a list must hold exactly one such map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use nodes::{storage_key, ExecutionContext, StorageAccessor, StorageError, STORAGE_SCHEME};

use crate::RequestError;

/// Prefix that marks a string as a reference into internal storage.
pub const STORAGE_PREFIX: &str = "kestra://";

/// The `from` property as written in the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageSource {
    Text(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
    /// Numbers, booleans, null: always rejected by [`resolve`].
    Other(Value),
}

/// One header's value(s) as given in the `headers` map.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Single(Value),
    Multi(Vec<Value>),
}

/// Canonical `{headers, data}` form of a message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageDescriptor {
    /// Header entries in the order they were written.
    pub headers: Vec<(String, HeaderValue)>,
    pub data: String,
}

impl MessageDescriptor {
    /// A body-only message.
    pub fn from_data(data: impl Into<String>) -> Self {
        Self {
            headers: Vec::new(),
            data: data.into(),
        }
    }

    /// Build a descriptor from a `{headers?, data?}` map.
    ///
    /// A `headers` entry that is not a map is ignored; a missing `data` is
    /// the empty string.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let headers = match map.get("headers") {
            Some(Value::Object(headers)) => headers
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::Array(values) => HeaderValue::Multi(values.clone()),
                        single => HeaderValue::Single(single.clone()),
                    };
                    (key.clone(), value)
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            headers,
            data: map.get("data").map(stringify).unwrap_or_default(),
        }
    }
}

/// String form of a property value: strings verbatim, everything else as
/// JSON text (`null`, `42`, `true`, `{"a":1}`).
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reduce `source` to a single message, rendering and reading from storage
/// through `ctx` where needed.
pub async fn resolve(
    source: &MessageSource,
    ctx: &ExecutionContext,
) -> Result<MessageDescriptor, RequestError> {
    match source {
        MessageSource::Text(template) => {
            let rendered = ctx.render(template)?;
            if rendered.starts_with(STORAGE_PREFIX) {
                let uri = parse_storage_uri(&rendered)?;
                let data = read_stored(ctx.storage(), &uri).await?;
                Ok(MessageDescriptor::from_data(data))
            } else {
                Ok(MessageDescriptor::from_data(rendered))
            }
        }
        MessageSource::List(items) => match items.as_slice() {
            [Value::Object(map)] => Ok(MessageDescriptor::from_map(map)),
            [_] => Err(RequestError::InvalidInput(
                "'from' list's single item must be a map".into(),
            )),
            _ => Err(RequestError::InvalidInput(format!(
                "'from' list must contain exactly one item for request-reply, got {}",
                items.len()
            ))),
        },
        MessageSource::Map(map) => Ok(MessageDescriptor::from_map(map)),
        MessageSource::Other(value) => Err(RequestError::InvalidInput(format!(
            "unsupported 'from' type ({}); must be String, Map, or single-item List<Map>",
            type_name(value)
        ))),
    }
}

/// Parse a `kestra://` string, re-check that the parsed scheme is the
/// storage scheme and that it names a file inside storage.
fn parse_storage_uri(raw: &str) -> Result<Url, RequestError> {
    let uri = Url::parse(raw)
        .map_err(|e| RequestError::InvalidInput(format!("'{raw}' is not a valid URI: {e}")))?;
    ensure_storage_scheme(&uri)?;
    storage_key(&uri).map_err(|e| RequestError::InvalidInput(format!("invalid 'from': {e}")))?;
    Ok(uri)
}

fn ensure_storage_scheme(uri: &Url) -> Result<(), RequestError> {
    if uri.scheme().eq_ignore_ascii_case(STORAGE_SCHEME) {
        Ok(())
    } else {
        Err(RequestError::InvalidInput(
            "invalid 'from': must be a kestra:// URI or a plain string".into(),
        ))
    }
}

async fn read_stored(storage: &dyn StorageAccessor, uri: &Url) -> Result<String, RequestError> {
    let mut stream = storage.open(uri).await?;
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .await
        .map_err(|source| StorageError::Io { uri: uri.to_string(), source })?;
    debug!("read {} bytes from {}", content.len(), uri);
    Ok(String::from_utf8_lossy(&content).into_owned())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context_with;
    use nodes::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn source(value: Value) -> MessageSource {
        serde_json::from_value(value).unwrap()
    }

    async fn resolve_plain(value: Value) -> Result<MessageDescriptor, RequestError> {
        let ctx = context_with(json!({}), Arc::new(MemoryStorage::new()));
        resolve(&source(value), &ctx).await
    }

    #[test]
    fn from_deserializes_into_matching_variant() {
        assert!(matches!(source(json!("hi")), MessageSource::Text(_)));
        assert!(matches!(source(json!([{}])), MessageSource::List(_)));
        assert!(matches!(source(json!({"data": "x"})), MessageSource::Map(_)));
        assert!(matches!(source(json!(42)), MessageSource::Other(_)));
        assert!(matches!(source(json!(null)), MessageSource::Other(_)));
    }

    #[tokio::test]
    async fn plain_string_is_rendered_into_data() {
        let ctx = context_with(
            json!({ "inputs": { "name": "bob" } }),
            Arc::new(MemoryStorage::new()),
        );
        let descriptor = resolve(&source(json!("Hello {{ inputs.name }}")), &ctx)
            .await
            .unwrap();
        assert_eq!(descriptor, MessageDescriptor::from_data("Hello bob"));
    }

    #[tokio::test]
    async fn storage_uri_is_replaced_by_file_content() {
        let storage = MemoryStorage::new();
        let uri = Url::parse("kestra:///company/team/42/body.json").unwrap();
        storage.put(&uri, "{\"big\": \"payload\"}").unwrap();

        let ctx = context_with(json!({ "execution": { "id": "42" } }), Arc::new(storage));
        let descriptor = resolve(
            &source(json!("kestra:///company/team/{{ execution.id }}/body.json")),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(descriptor.data, "{\"big\": \"payload\"}");
        assert!(descriptor.headers.is_empty());
    }

    #[tokio::test]
    async fn missing_stored_file_is_a_storage_error() {
        let result = resolve_plain(json!("kestra:///nowhere.txt")).await;
        assert!(matches!(
            result,
            Err(RequestError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn malformed_storage_uris_are_invalid_input() {
        for raw in ["kestra:///", "kestra://../etc/passwd", "kestra://a b"] {
            let result = resolve_plain(json!(raw)).await;
            assert!(
                matches!(result, Err(RequestError::InvalidInput(_))),
                "{raw} gave {result:?}"
            );
        }
    }

    #[test]
    fn parsed_scheme_is_checked_again() {
        let uri = Url::parse("https://example.com/file.txt").unwrap();
        assert!(matches!(
            ensure_storage_scheme(&uri),
            Err(RequestError::InvalidInput(_))
        ));
        let uri = Url::parse("kestra:///file.txt").unwrap();
        assert!(ensure_storage_scheme(&uri).is_ok());
    }

    #[tokio::test]
    async fn map_headers_and_data_pass_through() {
        let descriptor = resolve_plain(json!({
            "headers": { "single": "one", "count": 3, "multi": ["a", "b"] },
            "data": "X"
        }))
        .await
        .unwrap();

        assert_eq!(descriptor.data, "X");
        assert_eq!(
            descriptor.headers,
            vec![
                ("single".to_string(), HeaderValue::Single(json!("one"))),
                ("count".to_string(), HeaderValue::Single(json!(3))),
                ("multi".to_string(), HeaderValue::Multi(vec![json!("a"), json!("b")])),
            ]
        );
    }

    #[tokio::test]
    async fn empty_map_yields_empty_message() {
        let descriptor = resolve_plain(json!({})).await.unwrap();
        assert_eq!(descriptor, MessageDescriptor::default());
    }

    #[tokio::test]
    async fn non_string_data_is_stringified() {
        let descriptor = resolve_plain(json!({ "data": { "id": 7 } })).await.unwrap();
        assert_eq!(descriptor.data, "{\"id\":7}");

        let descriptor = resolve_plain(json!({ "data": 12.5 })).await.unwrap();
        assert_eq!(descriptor.data, "12.5");
    }

    #[tokio::test]
    async fn single_item_list_uses_its_map() {
        let descriptor = resolve_plain(json!([{ "data": "only-one" }])).await.unwrap();
        assert_eq!(descriptor, MessageDescriptor::from_data("only-one"));
    }

    #[tokio::test]
    async fn lists_of_other_lengths_are_rejected() {
        for value in [json!([]), json!([{ "data": "only-one" }, { "data": "two" }])] {
            match resolve_plain(value).await {
                Err(RequestError::InvalidInput(msg)) => assert!(msg.contains("exactly one item")),
                other => panic!("expected InvalidInput, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn list_item_must_be_a_map() {
        assert!(matches!(
            resolve_plain(json!(["not-a-map"])).await,
            Err(RequestError::InvalidInput(msg)) if msg.contains("must be a map")
        ));
    }

    #[tokio::test]
    async fn scalar_from_is_unsupported() {
        assert!(matches!(
            resolve_plain(json!(true)).await,
            Err(RequestError::InvalidInput(msg)) if msg.contains("unsupported")
        ));
    }
}
