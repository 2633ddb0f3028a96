//! Connection properties and duration parsing shared by NATS tasks.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How to reach and authenticate against the NATS server.
///
/// Flattened into the task's own properties, so a flow writes `url`,
/// `username`, ... next to `subject`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Server address, e.g. `nats://localhost:4222`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Content of a `.creds` file (JWT + NKey seed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creds: Option<String>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            token: None,
            creds: None,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .field("creds", &redact(&self.creds))
            .finish()
    }
}

/// Parse a duration property.
///
/// Accepts a bare number of milliseconds (`"2000"`), a human-readable
/// duration (`"2s"`, `"1m 30s"`) or an ISO-8601 time duration (`"PT2S"`).
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }

    let human = match raw.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("PT") => raw[2..].to_ascii_lowercase(),
        _ => raw.to_owned(),
    };
    humantime::parse_duration(&human).map_err(|e| format!("invalid duration '{raw}': {e}"))
}

/// Serde adapter for durations written as milliseconds or duration strings.
pub mod duration {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => Ok(Duration::from_millis(millis)),
            Raw::Text(text) => super::parse_duration(&text).map_err(de::Error::custom),
        }
    }
}
