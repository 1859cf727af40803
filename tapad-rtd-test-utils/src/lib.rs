//! Tapad RTD Test Utilities
//!
//! Centralized test infrastructure for the Tapad RTD workspace:
//! - Mock transport with scripted responses and an optional release gate
//! - Manual clock and a store that fails every operation
//! - Proptest generators for configs, consent and cache records
//! - Fixtures for envelope service responses and seeded stores
//! - Assertions for the error taxonomy

// Re-export core types for convenience
pub use tapad_rtd_client::EnvelopeTransport;
pub use tapad_rtd_core::{
    BidRequest, Clock, CodecError, ConfigError, DataEnvelope, EnvelopeEntry, GdprConsent,
    IdValue, RtdConfig, RtdError, RtdResult, StorageError, Timestamp, TransportError,
    UserConsent,
};
pub use tapad_rtd_storage::{CacheKeys, CacheRecord, InMemoryStore, KeyValueStore};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// Scripted [`EnvelopeTransport`].
///
/// Responses are served in the order they were pushed; once the script runs
/// out the fallback (if any) is repeated, otherwise the request fails as
/// unreachable. Every requested URL is recorded.
///
/// A gated transport holds each request until [`release`] is called, which
/// lets a test observe the cache while a fetch is in flight.
///
/// [`release`]: MockTransport::release
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<RtdResult<String>>>,
    fallback: Mutex<Option<RtdResult<String>>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
    received: Notify,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that blocks every request until released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    /// Queue a successful body.
    pub fn respond_with(self, body: impl Into<String>) -> Self {
        self.push_body(body);
        self
    }

    /// Serve `body` whenever the script is empty.
    pub fn always(self, body: impl Into<String>) -> Self {
        *self.fallback.lock().unwrap() = Some(Ok(body.into()));
        self
    }

    pub fn push_body(&self, body: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_error(&self, error: impl Into<RtdError>) {
        self.script.lock().unwrap().push_back(Err(error.into()));
    }

    /// Let one held request proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Resolve once at least `count` requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let notified = self.received.notified();
            if self.request_count() >= count {
                return;
            }
            notified.await;
        }
    }

    fn next_response(&self, url: &str) -> RtdResult<String> {
        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return response;
        }
        match self.fallback.lock().unwrap().as_ref() {
            Some(response) => response.clone(),
            None => Err(TransportError::Unreachable {
                url: url.to_string(),
                reason: "no scripted response".to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl EnvelopeTransport for MockTransport {
    async fn get(&self, url: &str) -> RtdResult<String> {
        {
            self.requests.lock().unwrap().push(url.to_string());
        }
        self.received.notify_waiters();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.next_response(url)
    }
}

// ============================================================================
// CLOCK AND STORE DOUBLES
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(at: Timestamp) -> Self {
        Self { now: Mutex::new(at) }
    }

    pub fn starting_now() -> Self {
        Self::new(chrono::Utc::now())
    }

    pub fn set(&self, at: Timestamp) {
        *self.now.lock().unwrap() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

/// Key-value store whose every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> RtdResult<Option<String>> {
        Err(StorageError::ReadFailed {
            key: key.to_string(),
            reason: "storage unavailable".to_string(),
        }
        .into())
    }

    fn set(&self, key: &str, _value: &str) -> RtdResult<()> {
        Err(StorageError::WriteFailed {
            key: key.to_string(),
            reason: "storage unavailable".to_string(),
        }
        .into())
    }

    fn remove(&self, key: &str) -> RtdResult<()> {
        Err(StorageError::RemoveFailed {
            key: key.to_string(),
            reason: "storage unavailable".to_string(),
        }
        .into())
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Tapad RTD types.

    use super::*;
    use proptest::prelude::*;

    /// Non-zero offset in seconds, so a boundary is never equal to `now`.
    pub fn arb_offset_secs() -> impl Strategy<Value = i64> {
        prop_oneof![-86_400i64..-1, 1i64..86_400]
    }

    pub fn arb_bidder() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    pub fn arb_id_value() -> impl Strategy<Value = IdValue> {
        prop_oneof![
            "[a-zA-Z0-9@._-]{1,24}".prop_map(IdValue::Single),
            prop::collection::vec("[a-zA-Z0-9@._-]{1,24}", 0..4).prop_map(IdValue::Multiple),
        ]
    }

    pub fn arb_config() -> impl Strategy<Value = RtdConfig> {
        (
            "[a-z0-9]{1,12}",
            prop::collection::vec(arb_bidder(), 0..4),
            prop::collection::vec(("[a-z]{1,8}", arb_id_value()), 0..3),
        )
            .prop_map(|(account_id, bidders, ids): (String, Vec<String>, Vec<(String, IdValue)>)| {
                let mut config = RtdConfig::new(account_id).with_bidders(bidders);
                config.ids = ids.into_iter().collect();
                config
            })
    }

    pub fn arb_consent() -> impl Strategy<Value = UserConsent> {
        (
            proptest::option::of((
                proptest::option::of(any::<bool>()),
                proptest::option::of("[A-Za-z0-9_-]{1,40}"),
            )),
            proptest::option::of("1[YN-]{3}"),
        )
            .prop_map(|(gdpr, usp_consent)| UserConsent {
                gdpr: gdpr.map(|(gdpr_applies, consent_string)| GdprConsent {
                    gdpr_applies,
                    consent_string,
                }),
                usp_consent,
            })
    }

    /// Envelope JSON value with one entry per generated bidder.
    pub fn arb_envelope_value() -> impl Strategy<Value = serde_json::Value> {
        prop::collection::vec((arb_bidder(), any::<i32>()), 0..5).prop_map(|entries| {
            serde_json::Value::Array(
                entries
                    .into_iter()
                    .map(|(bidder, n)| serde_json::json!({"bidder": bidder, "data": {"n": n}}))
                    .collect(),
            )
        })
    }

    /// Cache record whose boundaries sit at non-zero offsets from `now`.
    ///
    /// `data` and `no_track` are generated independently of each other, so
    /// records violating their mutual exclusion are produced too.
    pub fn arb_cache_record(now: Timestamp) -> impl Strategy<Value = CacheRecord> {
        (
            proptest::option::of(arb_offset_secs()),
            proptest::option::of(arb_offset_secs()),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(move |(stale, expires, has_data, no_track)| CacheRecord {
                data: has_data.then(|| r#"[{"bidder":"x","data":{"foo":1}}]"#.to_string()),
                stale: stale.map(|s| fixtures::millis_from(now, s)),
                expiration: expires.map(|s| fixtures::millis_from(now, s)),
                no_track: no_track.then(|| "no_track".to_string()),
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::Duration;
    use serde_json::{json, Value};

    /// Epoch-millisecond text for `now + secs`.
    pub fn millis_from(now: Timestamp, secs: i64) -> String {
        (now + Duration::seconds(secs)).timestamp_millis().to_string()
    }

    /// `{accountId: "abc", bidders: ["x"]}`
    pub fn sample_config() -> RtdConfig {
        RtdConfig::new("abc").with_bidders(["x"])
    }

    pub fn sample_consent() -> UserConsent {
        UserConsent::default()
            .with_gdpr(true, "CONSENT")
            .with_usp("1YNN")
    }

    /// `[{bidder: "x", data: {foo: 1}}]`
    pub fn sample_envelope() -> Value {
        json!([{"bidder": "x", "data": {"foo": 1}}])
    }

    /// `status: "ok"` body with boundaries relative to `now`.
    pub fn ok_body(now: Timestamp, stale_secs: i64, expires_secs: i64, data: Value) -> String {
        json!({
            "status": "ok",
            "staleAt": (now + Duration::seconds(stale_secs)).timestamp_millis(),
            "expiresAt": (now + Duration::seconds(expires_secs)).timestamp_millis(),
            "data": data,
        })
        .to_string()
    }

    /// `status: "no_track"` body with boundaries relative to `now`.
    pub fn no_track_body(now: Timestamp, stale_secs: i64, expires_secs: i64) -> String {
        json!({
            "status": "no_track",
            "staleAt": (now + Duration::seconds(stale_secs)).timestamp_millis(),
            "expiresAt": (now + Duration::seconds(expires_secs)).timestamp_millis(),
        })
        .to_string()
    }

    /// Store pre-populated with an envelope under the default keys.
    pub fn seeded_store(
        now: Timestamp,
        stale_secs: i64,
        expires_secs: i64,
        data: &Value,
    ) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let keys = CacheKeys::default();
        store
            .set(keys.stale(), &millis_from(now, stale_secs))
            .unwrap();
        store
            .set(keys.expiration(), &millis_from(now, expires_secs))
            .unwrap();
        store.set(keys.data(), &data.to_string()).unwrap();
        store
    }

    /// Store pre-populated with a no-track flag under the default keys.
    pub fn no_track_store(now: Timestamp, stale_secs: i64, expires_secs: i64) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let keys = CacheKeys::default();
        store
            .set(keys.stale(), &millis_from(now, stale_secs))
            .unwrap();
        store
            .set(keys.expiration(), &millis_from(now, expires_secs))
            .unwrap();
        store.set(keys.no_track(), "no_track").unwrap();
        store
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over Tapad RTD results and requests.

    use super::*;

    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &RtdResult<T>) {
        match result {
            Err(RtdError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_transport_error<T: std::fmt::Debug>(result: &RtdResult<T>) {
        match result {
            Err(RtdError::Transport(_)) => {}
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_codec_error<T: std::fmt::Debug>(result: &RtdResult<T>) {
        match result {
            Err(RtdError::Codec(_)) => {}
            other => panic!("Expected Codec error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &RtdResult<T>) {
        match result {
            Err(RtdError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert the fragment for `bidder` equals `expected`.
    #[track_caller]
    pub fn assert_fragment(request: &BidRequest, bidder: &str, expected: &serde_json::Value) {
        match request.fragment(bidder) {
            Some(actual) => assert_eq!(actual, expected, "fragment for bidder {}", bidder),
            None => panic!("No fragment for bidder {}", bidder),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
