//! Request and response documents exchanged with the pipeline driver.
//!
//! Every invocation reads one JSON request on stdin and writes one JSON
//! response on stdout. The `source` block is shared by all three directions.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::message::OutMessage;

/// Number of messages fetched per check cycle.
pub const HISTORY_PAGE_SIZE: u32 = 100;

// ── Version ─────────────────────────────────────────────────────────

/// Opaque version marker handed back and forth with the pipeline driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(BTreeMap<String, String>);

impl Version {
    pub const TIMESTAMP: &'static str = "timestamp";
    /// Key used by request-style pipelines for the same value.
    pub const REQUEST: &'static str = "request";

    pub fn from_timestamp(ts: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(Self::TIMESTAMP.to_string(), ts.into());
        Self(fields)
    }

    /// The `timestamp` key, if present and non-empty.
    pub fn timestamp(&self) -> Option<&str> {
        self.get(Self::TIMESTAMP)
    }

    /// The timestamp a fetch should retrieve: `timestamp`, falling back to `request`.
    pub fn requested_timestamp(&self) -> Option<&str> {
        self.timestamp().or_else(|| self.get(Self::REQUEST))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

// ── Timestamp ───────────────────────────────────────────────────────

/// A chat timestamp such as `1700000000.000100`.
///
/// Ordered numerically on (seconds, sub-second) so that differing
/// fraction widths still compare correctly.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: "timestamp".into(),
            message: format!("{raw:?}: {message}"),
        };

        let (secs, frac) = raw.split_once('.').unwrap_or((raw, ""));
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("seconds must be decimal digits"));
        }
        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("fraction must be at most nine decimal digits"));
        }

        let seconds = secs
            .parse::<i64>()
            .map_err(|e| invalid(&e.to_string()))?;
        let nanos = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}")
                .parse::<u32>()
                .map_err(|e| invalid(&e.to_string()))?
        };

        Ok(Self {
            raw: raw.to_string(),
            seconds,
            nanos,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Wall-clock time the message was posted, for diagnostics.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Source ──────────────────────────────────────────────────────────

/// Constraints a message must satisfy. Absent fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_pattern")]
    pub text_pattern: Option<Regex>,
}

impl Filter {
    /// The author constraint, treating an empty string as unset.
    pub fn author(&self) -> Option<&str> {
        self.author_id.as_deref().filter(|id| !id.is_empty())
    }

    fn describe(&self) -> String {
        format!(
            "author={} pattern={}",
            self.author().unwrap_or("*"),
            self.text_pattern.as_ref().map_or("*", Regex::as_str)
        )
    }
}

/// The resource's `source` configuration block.
#[derive(Debug, Default, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub reply_filter: Option<Filter>,
}

impl Source {
    /// Check the fields every direction needs before touching the network.
    /// Returns the bot token.
    pub fn validate(&self) -> Result<&SecretString, ConfigError> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or_else(|| ConfigError::missing("source", "token"))?;
        if self.channel_id.is_empty() {
            return Err(ConfigError::missing("source", "channel_id"));
        }
        Ok(token)
    }

    /// Emit the configured filters at info level.
    pub fn log_filters(&self) {
        if let Some(filter) = &self.filter {
            tracing::info!(filter = %filter.describe(), "Message filter");
        }
        if let Some(filter) = &self.reply_filter {
            tracing::info!(filter = %filter.describe(), "Reply filter");
        }
    }
}

fn deserialize_pattern<'de, D>(deserializer: D) -> Result<Option<Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(pattern) => Regex::new(&pattern)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(SecretString::from))
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub source: Source,
    #[serde(default)]
    pub version: Option<Version>,
}

#[derive(Debug, Deserialize)]
pub struct InRequest {
    pub source: Source,
    #[serde(default)]
    pub version: Option<Version>,
}

#[derive(Debug, Deserialize)]
pub struct OutRequest {
    pub source: Source,
    #[serde(default)]
    pub params: OutParams,
}

/// `put` parameters: an inline message or a JSON file holding one.
#[derive(Debug, Default, Deserialize)]
pub struct OutParams {
    #[serde(default)]
    pub message: Option<OutMessage>,
    #[serde(default)]
    pub message_file: Option<String>,
}

// ── Responses ───────────────────────────────────────────────────────

pub type CheckResponse = Vec<Version>;

#[derive(Debug, Serialize, PartialEq)]
pub struct InResponse {
    pub version: Version,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OutResponse {
    pub version: Version,
}

/// Parse a request document, mapping decode failures to configuration errors.
pub fn parse_request<T>(input: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(input).map_err(|e| ConfigError::ParseError(e.to_string()))
}
