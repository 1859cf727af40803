//! User consent data handed over by the host on every call.

use serde::{Deserialize, Serialize};

/// GDPR consent as resolved by the host's consent management module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GdprConsent {
    #[serde(default)]
    pub gdpr_applies: Option<bool>,
    #[serde(default)]
    pub consent_string: Option<String>,
}

/// Consent bundle for a single bidding cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConsent {
    #[serde(default)]
    pub gdpr: Option<GdprConsent>,
    /// CCPA / US privacy string, e.g. `1YNN`.
    #[serde(default)]
    pub usp_consent: Option<String>,
}

impl UserConsent {
    pub fn with_gdpr(mut self, applies: bool, consent_string: impl Into<String>) -> Self {
        self.gdpr = Some(GdprConsent {
            gdpr_applies: Some(applies),
            consent_string: Some(consent_string.into()),
        });
        self
    }

    pub fn with_usp(mut self, usp: impl Into<String>) -> Self {
        self.usp_consent = Some(usp.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.gdpr.is_none() && self.usp_consent.is_none()
    }
}
