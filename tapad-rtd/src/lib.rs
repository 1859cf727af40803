//! Tapad RTD - Real-Time Data Submodule
//!
//! Fetches a small identity/consent data envelope from the Tapad envelope
//! service, caches it in a host key-value store with stale and expiry
//! boundaries, and merges bidder fragments of it into outgoing bid
//! requests. The bidding cycle never waits on the network: refreshes run
//! on an injected tokio runtime and write the cache when they complete.
//!
//! # Example
//!
//! ```ignore
//! let cache = EnvelopeCache::new(store, Arc::new(HttpTransport::with_defaults()?), Handle::current());
//! let mut registry = SubmoduleRegistry::new();
//! registry.register(Arc::new(TapadRtdSubmodule::new(cache)), config, None);
//!
//! let altered = registry.get_bid_request_data(&mut request, Box::new(|| {}), None);
//! ```

pub mod background;
pub mod config;
pub mod envelope_cache;
pub mod registry;
pub mod submodule;
pub mod telemetry;

pub use background::BackgroundFetch;
pub use config::{ConsentConfig, ProbeConfig, ProbeConfigError};
pub use envelope_cache::{EnvelopeCache, Evaluation};
pub use registry::SubmoduleRegistry;
pub use submodule::{DoneCallback, RtdSubmodule, TapadRtdSubmodule};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, TelemetryError};

pub use tapad_rtd_client::{EnvelopeTransport, HttpTransport, HttpTransportConfig};
pub use tapad_rtd_core::{
    BidRequest, Clock, GdprConsent, RtdConfig, RtdError, RtdResult, SystemClock, UserConsent,
};
pub use tapad_rtd_storage::{CacheKeys, InMemoryStore, KeyValueStore, StoredOutcome};
