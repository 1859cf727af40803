//! Tapad RTD Core - Data Types
//!
//! Plain data structures shared by every crate in the workspace: submodule
//! configuration, consent, the data envelope and its service response, bid
//! request fragments and the error taxonomy. The only behavior here is pure
//! (deep merge, timestamp parsing) plus the clock seam; storage and I/O
//! live elsewhere.

pub mod clock;
pub mod config;
pub mod consent;
pub mod envelope;
pub mod error;
pub mod merge;
pub mod request;
pub mod timestamp;

pub use clock::{Clock, SystemClock};
pub use config::{IdHints, IdValue, RtdConfig, DEFAULT_ENDPOINT};
pub use consent::{GdprConsent, UserConsent};
pub use envelope::{DataEnvelope, EnvelopeEntry, EnvelopeResponse, NO_TRACK_STATUS};
pub use error::{CodecError, ConfigError, RtdError, RtdResult, StorageError, TransportError};
pub use merge::{deep_merge, merge_object};
pub use request::BidRequest;
pub use timestamp::{has_passed, parse_timestamp, timestamp_text, Timestamp};

/// Name the submodule registers under with the host.
pub const SUBMODULE_NAME: &str = "tapad_rtd";
