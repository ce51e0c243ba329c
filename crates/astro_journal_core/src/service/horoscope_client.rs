//! Remote horoscope source.
//!
//! # Responsibility
//! - Define the `HoroscopeSource` seam used by the orchestrator.
//! - Implement it over the Aztro HTTP API.
//!
//! # Invariants
//! - A response body maps to `HoroscopeData` field by field; missing fields
//!   become `""` and the result still counts as success.
//! - An empty or `null` body is `Ok(None)`, not an error.

use crate::model::horoscope::HoroscopeData;
use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default remote endpoint.
pub const AZTRO_API_URL: &str = "https://aztro.sameerkumar.website/";

/// Day qualifier sent with every request.
const DAY_QUALIFIER: &str = "today";

#[derive(Debug)]
pub enum SourceError {
    Http(reqwest::Error),
    /// Body was present but not a JSON object.
    Decode(String),
    /// Remote answered without a body.
    EmptyBody,
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "horoscope request failed: {err}"),
            Self::Decode(details) => write!(f, "horoscope response is malformed: {details}"),
            Self::EmptyBody => write!(f, "horoscope response had no body"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(_) | Self::EmptyBody => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Provider of today's horoscope for a sign identifier.
#[async_trait]
pub trait HoroscopeSource: Send + Sync {
    /// Returns `Ok(None)` when the remote answered without a body.
    async fn fetch_today(&self, sign: &str) -> Result<Option<HoroscopeData>, SourceError>;
}

/// HTTP client for the Aztro horoscope API.
pub struct AztroClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AztroClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for AztroClient {
    fn default() -> Self {
        Self::new(AZTRO_API_URL)
    }
}

#[async_trait]
impl HoroscopeSource for AztroClient {
    async fn fetch_today(&self, sign: &str) -> Result<Option<HoroscopeData>, SourceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("sign", sign), ("day", DAY_QUALIFIER)])
            .send()
            .await?
            .error_for_status()?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            "event=horoscope_remote module=service status=ok http_status={} bytes={}",
            status.as_u16(),
            body.len()
        );
        parse_remote_body(&body)
    }
}

/// Maps a raw response body to horoscope data.
pub fn parse_remote_body(body: &str) -> Result<Option<HoroscopeData>, SourceError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|err| SourceError::Decode(err.to_string()))?;
    match value {
        Value::Null => Ok(None),
        Value::Object(fields) => Ok(Some(HoroscopeData {
            description: field(&fields, "description"),
            compatibility: field(&fields, "compatibility"),
            mood: field(&fields, "mood"),
            color: field(&fields, "color"),
            lucky_number: field(&fields, "lucky_number"),
            lucky_time: field(&fields, "lucky_time"),
            date_range: field(&fields, "date_range"),
            current_date: field(&fields, "current_date"),
        })),
        other => Err(SourceError::Decode(format!(
            "expected a JSON object, got `{}`",
            json_kind(&other)
        ))),
    }
}

fn field(fields: &Map<String, Value>, name: &str) -> String {
    match fields.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_remote_body, SourceError};

    #[test]
    fn full_body_maps_every_field() {
        let body = r#"{
            "description": "A good day.",
            "compatibility": "Leo",
            "mood": "Happy",
            "color": "Red",
            "lucky_number": 7,
            "lucky_time": "2pm",
            "date_range": "Mar 21 - Apr 20",
            "current_date": "January 15, 2024"
        }"#;
        let data = parse_remote_body(body).unwrap().unwrap();
        assert_eq!(data.description, "A good day.");
        assert_eq!(data.lucky_number, "7");
        assert_eq!(data.current_date, "January 15, 2024");
    }

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let data = parse_remote_body(r#"{"mood":"Calm"}"#).unwrap().unwrap();
        assert_eq!(data.mood, "Calm");
        assert_eq!(data.description, "");
        assert_eq!(data.current_date, "");
    }

    #[test]
    fn empty_or_null_body_is_no_data() {
        assert_eq!(parse_remote_body("").unwrap(), None);
        assert_eq!(parse_remote_body("null").unwrap(), None);
    }

    #[test]
    fn non_object_body_is_decode_error() {
        assert!(matches!(
            parse_remote_body("[1,2]"),
            Err(SourceError::Decode(_))
        ));
        assert!(matches!(
            parse_remote_body("<html>"),
            Err(SourceError::Decode(_))
        ));
    }
}
