use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::LookupConfig;

/// Values the API uses to mean "no data".
const SENTINELS: [&str; 3] = ["", "NA", "N/A"];

/// Why a lookup produced no usable result.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The API answered with a non-success status.
    #[error("lookup API returned HTTP {0}")]
    ServiceUnavailable(reqwest::StatusCode),

    /// The request never completed (DNS, refused connection, timeout, broken body).
    #[error("failed to reach lookup API: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// Anything else, including a body that is not a JSON object.
    #[error("unexpected lookup failure: {0}")]
    Unknown(String),
}

/// A single value from the API's response object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    /// Arrays and objects, kept as raw JSON.
    Nested(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Absent,
            Value::Bool(b) => FieldValue::Flag(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Nested(other),
        }
    }
}

impl FieldValue {
    /// Whether the value carries anything at all: null, false, zero and
    /// empty strings or collections do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Absent => false,
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Nested(Value::Array(items)) => !items.is_empty(),
            FieldValue::Nested(Value::Object(map)) => !map.is_empty(),
            FieldValue::Nested(_) => true,
        }
    }

    /// Truthy and not one of the "no data" sentinels once trimmed.
    pub fn is_usable(&self) -> bool {
        self.is_truthy() && !SENTINELS.contains(&self.to_string().trim())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => write!(f, "None"),
            FieldValue::Flag(true) => write!(f, "True"),
            FieldValue::Flag(false) => write!(f, "False"),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Nested(v) => write!(f, "{}", v),
        }
    }
}

/// Parsed lookup response, in the order the API returned its fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    fields: Vec<(String, FieldValue)>,
}

impl LookupResult {
    /// Parse a response body. Anything but a JSON object is an `Unknown` failure.
    pub fn parse(body: &str) -> Result<Self, LookupError> {
        let object: Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| LookupError::Unknown(format!("response is not a JSON object: {}", e)))?;
        Ok(Self::from(object))
    }

    /// The API's `error` field, when present and truthy.
    pub fn error(&self) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == "error")
            .map(|(_, value)| value)
            .filter(|value| value.is_truthy())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields worth showing to the user, in response order.
    pub fn usable_fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields().filter(|(_, value)| value.is_usable())
    }
}

impl From<Map<String, Value>> for LookupResult {
    fn from(object: Map<String, Value>) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from(value)))
                .collect(),
        }
    }
}

/// Query parameters sent to the lookup endpoint.
#[derive(Debug, Serialize)]
struct LookupQuery<'a> {
    key: &'a str,
    number: &'a str,
}

/// Anything that can turn a subject into a lookup result.
#[async_trait]
pub trait PhoneLookup: Send + Sync {
    async fn lookup(&self, subject: &str) -> Result<LookupResult, LookupError>;
}

pub struct LookupClient {
    client: reqwest::Client,
    config: LookupConfig,
}

impl LookupClient {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.api_url
    }
}

#[async_trait]
impl PhoneLookup for LookupClient {
    async fn lookup(&self, subject: &str) -> Result<LookupResult, LookupError> {
        let query = LookupQuery {
            key: &self.config.api_key,
            number: subject,
        };

        debug!("Sending lookup request to {}", self.config.api_url);

        // Single attempt, client default timeouts
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    LookupError::Unknown(format!("invalid lookup request: {}", e))
                } else {
                    LookupError::Connectivity(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::ServiceUnavailable(status));
        }

        let body = response.text().await.map_err(LookupError::Connectivity)?;
        let result = LookupResult::parse(&body)?;

        info!("API response: {}", body.trim());
        Ok(result)
    }
}
