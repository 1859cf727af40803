//! Data envelope and envelope-service response types.

use crate::timestamp::timestamp_text;
use crate::{CodecError, RtdResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status value the service uses to opt a user out of tracking.
pub const NO_TRACK_STATUS: &str = "no_track";

/// One bidder's slice of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeEntry {
    pub bidder: String,
    #[serde(default)]
    pub data: Value,
}

impl EnvelopeEntry {
    pub fn new(bidder: impl Into<String>, data: Value) -> Self {
        Self {
            bidder: bidder.into(),
            data,
        }
    }
}

/// Ordered per-bidder identity payloads.
///
/// Bidder codes are not guaranteed unique; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataEnvelope {
    entries: Vec<EnvelopeEntry>,
}

impl DataEnvelope {
    pub fn new(entries: Vec<EnvelopeEntry>) -> Self {
        Self { entries }
    }

    /// Build an envelope from an arbitrary JSON value.
    ///
    /// Returns `None` unless the value is an array. Array items without a
    /// string `bidder` field are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let entries = items
            .iter()
            .filter_map(|item| {
                let bidder = item.get("bidder")?.as_str()?;
                let data = item.get("data").cloned().unwrap_or(Value::Null);
                Some(EnvelopeEntry::new(bidder, data))
            })
            .collect();
        Some(Self { entries })
    }

    /// First entry for `bidder`, if any.
    pub fn find(&self, bidder: &str) -> Option<&EnvelopeEntry> {
        self.entries.iter().find(|entry| entry.bidder == bidder)
    }

    pub fn entries(&self) -> &[EnvelopeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    stale_at: Option<Value>,
    #[serde(default)]
    expires_at: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

/// Decoded body of `GET /acc/{accountId}/ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeResponse {
    pub status: Option<String>,
    /// Stale boundary as it should be persisted.
    pub stale_at: Option<String>,
    /// Expiry boundary as it should be persisted.
    pub expires_at: Option<String>,
    /// The raw `data` member; `Null` when absent.
    pub data: Value,
}

impl EnvelopeResponse {
    /// Parse a response body.
    ///
    /// Empty bodies and bodies that are not a JSON object are rejected.
    pub fn parse(body: &str) -> RtdResult<Self> {
        if body.trim().is_empty() {
            return Err(CodecError::EmptyBody.into());
        }

        let value: Value = serde_json::from_str(body).map_err(|e| CodecError::InvalidResponse {
            reason: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(CodecError::InvalidResponse {
                reason: "expected a JSON object".to_string(),
            }
            .into());
        }

        let raw: RawResponse =
            serde_json::from_value(value).map_err(|e| CodecError::InvalidResponse {
                reason: e.to_string(),
            })?;

        Ok(Self {
            status: raw.status,
            stale_at: raw.stale_at.as_ref().and_then(timestamp_text),
            expires_at: raw.expires_at.as_ref().and_then(timestamp_text),
            data: raw.data.unwrap_or(Value::Null),
        })
    }

    pub fn is_no_track(&self) -> bool {
        self.status.as_deref() == Some(NO_TRACK_STATUS)
    }

    /// The envelope carried by this response, if `data` is an array.
    pub fn envelope(&self) -> Option<DataEnvelope> {
        DataEnvelope::from_value(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RtdError;
    use serde_json::json;

    #[test]
    fn test_parse_ok_response() {
        let body = json!({
            "status": "ok",
            "staleAt": 1700000000000i64,
            "expiresAt": "2024-03-01T12:00:00Z",
            "data": [{"bidder": "x", "data": {"foo": 1}}]
        })
        .to_string();

        let response = EnvelopeResponse::parse(&body).unwrap();
        assert!(!response.is_no_track());
        assert_eq!(response.stale_at.as_deref(), Some("1700000000000"));
        assert_eq!(response.expires_at.as_deref(), Some("2024-03-01T12:00:00Z"));

        let envelope = response.envelope().unwrap();
        assert_eq!(envelope.len(), 1);
        assert_eq!(envelope.find("x").unwrap().data, json!({"foo": 1}));
    }

    #[test]
    fn test_parse_no_track_response() {
        let response =
            EnvelopeResponse::parse(r#"{"status":"no_track","staleAt":1,"expiresAt":2}"#).unwrap();
        assert!(response.is_no_track());
        assert_eq!(response.data, Value::Null);
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(matches!(
            EnvelopeResponse::parse("  "),
            Err(RtdError::Codec(CodecError::EmptyBody))
        ));
        assert!(matches!(
            EnvelopeResponse::parse("{not json"),
            Err(RtdError::Codec(CodecError::InvalidResponse { .. }))
        ));
        assert!(matches!(
            EnvelopeResponse::parse("[1,2]"),
            Err(RtdError::Codec(CodecError::InvalidResponse { .. }))
        ));
    }

    #[test]
    fn test_find_returns_first_match() {
        let envelope = DataEnvelope::new(vec![
            EnvelopeEntry::new("x", json!({"n": 1})),
            EnvelopeEntry::new("y", json!({"n": 2})),
            EnvelopeEntry::new("x", json!({"n": 3})),
        ]);
        assert_eq!(envelope.find("x").unwrap().data, json!({"n": 1}));
        assert!(envelope.find("z").is_none());
    }

    #[test]
    fn test_from_value_skips_malformed_entries() {
        let value = json!([
            {"bidder": "x", "data": {"a": 1}},
            {"data": {"b": 2}},
            {"bidder": 7},
            "junk",
            {"bidder": "y"}
        ]);
        let envelope = DataEnvelope::from_value(&value).unwrap();
        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.find("y").unwrap().data, Value::Null);

        assert!(DataEnvelope::from_value(&json!({"bidder": "x"})).is_none());
    }
}
