//! Transport contract for fetching the envelope.

use async_trait::async_trait;
use tapad_rtd_core::RtdResult;

/// Fetches a URL and returns the raw response body.
///
/// Implementations send credentials (cookies) with the request and set
/// `Content-Type: application/json`. A non-success status is an error. Any
/// timeout is the implementation's own; callers never cancel.
///
/// # Example
/// ```ignore
/// struct HostAjax { /* ... */ }
///
/// #[async_trait]
/// impl EnvelopeTransport for HostAjax {
///     async fn get(&self, url: &str) -> RtdResult<String> {
///         // Delegate to the host's HTTP stack
///     }
/// }
/// ```
#[async_trait]
pub trait EnvelopeTransport: Send + Sync {
    /// GET `url` and return the body as text.
    async fn get(&self, url: &str) -> RtdResult<String>;
}
