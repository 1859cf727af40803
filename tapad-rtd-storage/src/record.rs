//! The persisted cache record and its typed access layer.

use std::sync::Arc;

use tapad_rtd_core::{parse_timestamp, DataEnvelope, EnvelopeResponse, RtdResult};

use super::codec::{decode_envelope, encode_envelope};
use super::keys::{CacheKeys, NO_TRACK_FLAG};
use super::store::KeyValueStore;

/// Raw contents of the four cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    /// Encoded envelope.
    pub data: Option<String>,
    /// Expiry boundary as sent by the service.
    pub expiration: Option<String>,
    /// Stale boundary as sent by the service.
    pub stale: Option<String>,
    /// No-track flag; its value is irrelevant, only presence counts.
    pub no_track: Option<String>,
}

impl CacheRecord {
    pub fn is_no_track(&self) -> bool {
        self.no_track.is_some()
    }

    /// Decoded envelope, `None` when absent or unparseable.
    pub fn envelope(&self) -> Option<DataEnvelope> {
        decode_envelope(self.data.as_deref())
    }
}

/// What a fetch response did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredOutcome {
    /// An envelope was stored and the no-track flag cleared.
    Envelope { entries: usize },
    /// The no-track flag was set and the envelope removed.
    NoTrack,
}

/// Typed access to the cache record over a host key-value store.
#[derive(Clone)]
pub struct CacheRecordStore {
    store: Arc<dyn KeyValueStore>,
    keys: CacheKeys,
}

impl CacheRecordStore {
    /// Record store using the default key names.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(store, CacheKeys::default())
    }

    pub fn with_keys(store: Arc<dyn KeyValueStore>, keys: CacheKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read all four keys.
    pub fn load(&self) -> RtdResult<CacheRecord> {
        Ok(CacheRecord {
            data: self.store.get(self.keys.data())?,
            stale: self.store.get(self.keys.stale())?,
            expiration: self.store.get(self.keys.expiration())?,
            no_track: self.store.get(self.keys.no_track())?,
        })
    }

    /// Read and decode only the envelope.
    pub fn load_envelope(&self) -> RtdResult<Option<DataEnvelope>> {
        let raw = self.store.get(self.keys.data())?;
        Ok(decode_envelope(raw.as_deref()))
    }

    /// Apply a service response to the record.
    ///
    /// Both boundaries are always overwritten; a boundary missing from the
    /// response removes the stored one. Then the no-track flag or the
    /// envelope is written. The other one is removed first, so a failed
    /// write never leaves both keys set.
    pub fn store_response(&self, response: &EnvelopeResponse) -> RtdResult<StoredOutcome> {
        warn_on_inverted_boundaries(response);

        self.put_or_remove(self.keys.stale(), response.stale_at.as_deref())?;
        self.put_or_remove(self.keys.expiration(), response.expires_at.as_deref())?;

        if response.is_no_track() {
            self.store.remove(self.keys.data())?;
            self.store.set(self.keys.no_track(), NO_TRACK_FLAG)?;
            Ok(StoredOutcome::NoTrack)
        } else {
            let encoded = encode_envelope(&response.data)?;
            self.store.remove(self.keys.no_track())?;
            self.store.set(self.keys.data(), &encoded)?;
            Ok(StoredOutcome::Envelope {
                entries: response.envelope().map(|e| e.len()).unwrap_or(0),
            })
        }
    }

    fn put_or_remove(&self, key: &str, value: Option<&str>) -> RtdResult<()> {
        match value {
            Some(value) => self.store.set(key, value),
            None => self.store.remove(key),
        }
    }
}

impl std::fmt::Debug for CacheRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRecordStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

// The service is trusted: boundaries are stored as sent. Expiry is checked
// first when reading, so an inverted pair just behaves as expired early.
fn warn_on_inverted_boundaries(response: &EnvelopeResponse) {
    let stale = response.stale_at.as_deref().and_then(parse_timestamp);
    let expires = response.expires_at.as_deref().and_then(parse_timestamp);
    if let (Some(stale), Some(expires)) = (stale, expires) {
        if stale > expires {
            tracing::warn!(
                stale_at = %stale,
                expires_at = %expires,
                "envelope service sent staleAt after expiresAt"
            );
        }
    }
}
