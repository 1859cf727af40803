//! Envelope service URL construction.

use tapad_rtd_core::{RtdConfig, RtdResult, UserConsent};

use crate::query::build_query_string;

/// `{base}/acc/{accountId}/ids[?query]` for the given config and consent.
///
/// Fails only when the config has no account id.
pub fn envelope_url(config: &RtdConfig, consent: Option<&UserConsent>) -> RtdResult<String> {
    let account_id = config.require_account_id()?;
    let mut url = format!(
        "{}/acc/{}/ids",
        config.endpoint(),
        urlencoding::encode(account_id)
    );
    if let Some(query) = build_query_string(config, consent) {
        url.push('?');
        url.push_str(&query);
    }
    Ok(url)
}
