//! Tapad RTD Client - Envelope Service Access
//!
//! Builds the envelope request URL from account, identity hints and user
//! consent, and defines the transport used to fetch it. [`HttpTransport`]
//! is the reqwest-backed default; hosts with their own HTTP stack implement
//! [`EnvelopeTransport`] instead.

pub mod endpoint;
pub mod http;
pub mod query;
pub mod transport;

pub use endpoint::envelope_url;
pub use http::{HttpTransport, HttpTransportConfig};
pub use query::{build_query_string, consent_segment, ids_segment};
pub use transport::EnvelopeTransport;
