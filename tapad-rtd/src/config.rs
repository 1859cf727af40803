//! Configuration loading for the probe binary.
//!
//! The file is TOML. Submodule params live under `[params]` with the same
//! camelCase keys a host would pass; consent under `[consent]` is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tapad_rtd_client::HttpTransportConfig;
use tapad_rtd_core::{GdprConsent, RtdConfig, UserConsent};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub request_timeout_ms: u64,
    pub params: RtdConfig,
    #[serde(default)]
    pub consent: Option<ConsentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentConfig {
    pub gdpr_applies: Option<bool>,
    pub consent_string: Option<String>,
    pub us_privacy: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeConfigError {
    #[error("Missing configuration file path (use --config or TAPAD_RTD_PROBE_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ProbeConfig {
    pub fn load() -> Result<Self, ProbeConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ProbeConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ProbeConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ProbeConfigError> {
        let config: ProbeConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProbeConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ProbeConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if !self.params.is_enabled() {
            return Err(ProbeConfigError::InvalidValue {
                field: "params.accountId",
                reason: "must be a non-empty string".to_string(),
            });
        }
        self.params
            .validate()
            .map_err(|e| ProbeConfigError::InvalidValue {
                field: "params.endpoint",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig::new().with_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    /// Consent to send, `None` when the file has no `[consent]` table.
    pub fn user_consent(&self) -> Option<UserConsent> {
        let consent = self.consent.as_ref()?;
        let gdpr = (consent.gdpr_applies.is_some() || consent.consent_string.is_some()).then(|| {
            GdprConsent {
                gdpr_applies: consent.gdpr_applies,
                consent_string: consent.consent_string.clone(),
            }
        });
        Some(UserConsent {
            gdpr,
            usp_consent: consent.us_privacy.clone(),
        })
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("TAPAD_RTD_PROBE_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
