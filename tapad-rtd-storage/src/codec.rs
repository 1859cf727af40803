//! JSON encoding of the stored envelope.
//!
//! Every read and write of the `data` key goes through these two functions.
//! Decoding never fails loudly: anything that is not a JSON array of
//! envelope entries decodes to `None`, which callers treat as "nothing to
//! merge".

use serde_json::Value;
use tapad_rtd_core::{CodecError, DataEnvelope, RtdResult};

/// Serialize the service's `data` member for storage.
pub fn encode_envelope(data: &Value) -> RtdResult<String> {
    serde_json::to_string(data).map_err(|e| {
        CodecError::Serialize {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Decode a stored envelope, `None` when absent or unparseable.
pub fn decode_envelope(raw: Option<&str>) -> Option<DataEnvelope> {
    let raw = raw?;
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "stored envelope is not valid JSON");
            return None;
        }
    };

    let envelope = DataEnvelope::from_value(&value);
    if envelope.is_none() {
        tracing::debug!("stored envelope is not an array");
    }
    envelope
}
