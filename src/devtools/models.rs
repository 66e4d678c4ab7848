//! On-disk shapes for captured traffic.
//!
//! A network log file is a JSON array, one [`CommunicationRecord`] per hop
//! of the exchange (redirects produce one record each). Body fields hold
//! UTF-8 text where the payload decodes as text, otherwise a tagged
//! base64 structure, so binary responses survive the trip through JSON.

use crate::errors::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

/// A request or response body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPayload {
    /// Decodable text that did not parse as JSON.
    Text(String),
    /// Text that parsed as JSON, kept structured.
    Json(serde_json::Value),
    /// Undecodable bytes, serialized as `{"type":"bytes","data":"<base64>"}`.
    Bytes(Vec<u8>),
}

impl BodyPayload {
    /// Classify raw body bytes: JSON if they parse, text if they decode,
    /// bytes otherwise.
    pub fn from_raw_bytes(data: Vec<u8>) -> Self {
        match String::from_utf8(data) {
            Ok(text) => Self::from_text(text),
            Err(err) => BodyPayload::Bytes(err.into_bytes()),
        }
    }

    /// Classify body text: structured JSON when it parses as an object or
    /// array, plain text otherwise.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) if value.is_object() || value.is_array() => BodyPayload::Json(value),
            _ => BodyPayload::Text(text),
        }
    }
}

impl Serialize for BodyPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BodyPayload::Text(text) => serializer.serialize_str(text),
            BodyPayload::Json(value) => value.serialize(serializer),
            BodyPayload::Bytes(data) => {
                let tagged = serde_json::json!({
                    "type": "bytes",
                    "data": BASE64.encode(data),
                });
                tagged.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for BodyPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if let Some(text) = value.as_str() {
            return Ok(BodyPayload::Text(text.to_string()));
        }
        if let Some(map) = value.as_object() {
            if map.get("type").and_then(|v| v.as_str()) == Some("bytes") {
                let encoded = map
                    .get("data")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| D::Error::custom("bytes body without data field"))?;
                let data = BASE64
                    .decode(encoded)
                    .map_err(|e| D::Error::custom(format!("bad base64 body: {}", e)))?;
                return Ok(BodyPayload::Bytes(data));
            }
        }
        Ok(BodyPayload::Json(value))
    }
}

/// One captured request/response hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationRecord {
    pub status: Option<i64>,
    pub url: String,
    pub method: String,
    /// Protocol-reported timing object, passed through untouched.
    pub timing: Option<serde_json::Value>,
    pub request_headers: Option<serde_json::Value>,
    pub response_headers: Option<serde_json::Value>,
    pub request_body: Option<BodyPayload>,
    pub response_body: Option<BodyPayload>,
}

impl CommunicationRecord {
    /// Record for a request that has been sent but not yet answered.
    pub fn outgoing(
        url: impl Into<String>,
        method: impl Into<String>,
        request_headers: Option<serde_json::Value>,
        request_body: Option<BodyPayload>,
    ) -> Self {
        Self {
            status: None,
            url: url.into(),
            method: method.into(),
            timing: None,
            request_headers,
            response_headers: None,
            request_body,
            response_body: None,
        }
    }
}

fn complex_object() -> String {
    "<complex object>".to_string()
}

/// One argument of a console API call: a primitive rendering when the
/// protocol provided one, the object description otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleArg {
    pub value: Option<String>,
    #[serde(default = "complex_object")]
    pub description: String,
}

/// One `Runtime.consoleAPICalled` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub args: Vec<ConsoleArg>,
}

/// Write one exchange's records as a log file.
pub fn write_log(path: &Path, records: &[CommunicationRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Read a log file back.
pub fn read_log(path: &Path) -> Result<Vec<CommunicationRecord>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_bodies_stay_plain_strings() {
        let body = BodyPayload::from_raw_bytes(b"hello world".to_vec());
        assert_eq!(body, BodyPayload::Text("hello world".to_string()));
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!("hello world"));
    }

    #[test]
    fn json_bodies_are_kept_structured() {
        let body = BodyPayload::from_text(r#"{"ok":true}"#.to_string());
        assert_eq!(body, BodyPayload::Json(serde_json::json!({"ok": true})));
    }

    #[test]
    fn undecodable_bodies_round_trip_through_base64() {
        let data = vec![0u8, 159, 146, 150, 255];
        let body = BodyPayload::from_raw_bytes(data.clone());
        assert_eq!(body, BodyPayload::Bytes(data.clone()));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "bytes");
        assert_eq!(json["data"], BASE64.encode(&data));

        let back: BodyPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn record_round_trips_with_every_field_set() {
        let record = CommunicationRecord {
            status: Some(302),
            url: "https://example.com/login".to_string(),
            method: "POST".to_string(),
            timing: Some(serde_json::json!({"requestTime": 1234.5})),
            request_headers: Some(serde_json::json!({"Accept": "*/*"})),
            response_headers: Some(serde_json::json!({"Location": "/home"})),
            request_body: Some(BodyPayload::Json(serde_json::json!({"user": "fairy"}))),
            response_body: Some(BodyPayload::Bytes(vec![1, 2, 3])),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: CommunicationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn log_files_hold_one_array_per_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network").join("1000_42.json");

        let chain = vec![
            CommunicationRecord::outgoing("https://example.com/a", "GET", None, None),
            CommunicationRecord {
                status: Some(200),
                response_body: Some(BodyPayload::Text("done".to_string())),
                ..CommunicationRecord::outgoing("https://example.com/b", "GET", None, None)
            },
        ];
        write_log(&path, &chain).unwrap();

        let back = read_log(&path).unwrap();
        assert_eq!(back, chain);
    }

    #[test]
    fn console_args_default_to_the_complex_object_marker() {
        let message: ConsoleMessage =
            serde_json::from_str(r#"{"type":"log","args":[{"value":null}]}"#).unwrap();
        assert_eq!(message.args[0].description, "<complex object>");
        assert_eq!(message.args[0].value, None);
    }
}
