//! Tapad RTD Storage - Envelope Cache Record
//!
//! The envelope cache lives in a host-provided key-value store under four
//! keys (envelope, expiry, staleness, no-track). This crate defines the
//! store contract, the typed record layer on top of it, and the freshness
//! rules a bidding cycle applies to the record.
//!
//! # Example
//!
//! ```ignore
//! let records = CacheRecordStore::new(Arc::new(InMemoryStore::new()));
//! let decision = decide(&records.load()?, Utc::now());
//! if decision.should_fetch() {
//!     // refresh in the background
//! }
//! ```

pub mod codec;
pub mod freshness;
pub mod keys;
pub mod record;
pub mod store;

pub use codec::{decode_envelope, encode_envelope};
pub use freshness::{decide, CycleDecision, Freshness};
pub use keys::{CacheKeys, NO_TRACK_FLAG};
pub use record::{CacheRecord, CacheRecordStore, StoredOutcome};
pub use store::{InMemoryStore, KeyValueStore, StoreStats};
