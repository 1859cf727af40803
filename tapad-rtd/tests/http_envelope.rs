//! The envelope cache over the reqwest transport against a mock envelope
//! service.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tapad_rtd::{
    BidRequest, CacheKeys, EnvelopeCache, HttpTransport, HttpTransportConfig, InMemoryStore,
    KeyValueStore, RtdConfig, StoredOutcome, UserConsent,
};
use tapad_rtd_test_utils::{assertions, fixtures};
use tokio::runtime::Handle;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_cache(store: Arc<InMemoryStore>) -> EnvelopeCache {
    let transport = HttpTransport::new(
        HttpTransportConfig::new().with_timeout(Duration::from_millis(500)),
    )
    .unwrap();
    EnvelopeCache::new(store, Arc::new(transport), Handle::current())
}

#[tokio::test]
async fn test_fetch_stores_envelope_from_service() {
    let mock_server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/acc/abc/ids"))
        .and(query_param("gdpr", "true"))
        .and(query_param("gdpr_consent", "CONSENT"))
        .and(query_param("us_privacy", "1YNN"))
        .and(query_param("id.maid", "m1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixtures::ok_body(
            now,
            60,
            120,
            json!([{"bidder": "x", "data": {"user": {"ext": {"tapad": 1}}}}]),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let cache = http_cache(store.clone());
    let config = RtdConfig::new("abc")
        .with_bidders(["x"])
        .with_id("maid", "m1")
        .with_endpoint(mock_server.uri());
    let consent = fixtures::sample_consent();

    let evaluation = cache.evaluate_and_maybe_fetch(&config, Some(&consent), now);
    assert!(!evaluation.should_alter_bids);
    assert_eq!(
        evaluation.fetch.unwrap().wait().await,
        Some(StoredOutcome::Envelope { entries: 1 })
    );

    let evaluation = cache.evaluate_and_maybe_fetch(&config, Some(&consent), now);
    assert!(evaluation.should_alter_bids);
    assert!(evaluation.fetch.is_none());

    let mut request = BidRequest::new();
    request
        .bidder_fragments
        .insert("x".to_string(), json!({"user": {"id": "u"}}));
    cache.apply_to_request(&mut request, &config);
    assertions::assert_fragment(
        &request,
        "x",
        &json!({"user": {"id": "u", "ext": {"tapad": 1}}}),
    );
}

#[tokio::test]
async fn test_no_track_from_service() {
    let mock_server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/acc/abc/ids"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(fixtures::no_track_body(now, 60, 120)),
        )
        .mount(&mock_server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let cache = http_cache(store.clone());
    let config = fixtures::sample_config().with_endpoint(mock_server.uri());

    let outcome = cache.fetch_and_store(&config, None).await.unwrap();
    assert_eq!(outcome, StoredOutcome::NoTrack);
    assert!(store.get(CacheKeys::default().no_track()).unwrap().is_some());
    assert!(!cache
        .evaluate_and_maybe_fetch(&config, None, now)
        .should_alter_bids);
}

#[tokio::test]
async fn test_server_error_leaves_cache_unchanged() {
    let mock_server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/acc/abc/ids"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = fixtures::seeded_store(now, -10, 120, &fixtures::sample_envelope());
    let before = store.len();
    let cache = http_cache(store.clone());
    let config = fixtures::sample_config().with_endpoint(mock_server.uri());

    let result = cache.fetch_and_store(&config, None).await;
    assertions::assert_transport_error(&result);

    let evaluation = cache.evaluate_and_maybe_fetch(&config, None, now);
    assert!(evaluation.should_alter_bids);
    assert_eq!(evaluation.fetch.unwrap().wait().await, None);
    assert_eq!(store.len(), before);
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acc/abc/ids"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"ok"}"#)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let cache = http_cache(Arc::new(InMemoryStore::new()));
    let config = fixtures::sample_config().with_endpoint(mock_server.uri());

    let result = cache.fetch_and_store(&config, Some(&UserConsent::default())).await;
    assertions::assert_transport_error(&result);
}
