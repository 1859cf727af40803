//! Tracing subscriber setup for binaries embedding the submodule.
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the process that owns `main`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tapad_rtd=debug,info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `json` (any case) selects JSON; everything else is human-readable.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Service version
    pub service_version: String,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("TAPAD_RTD_SERVICE_NAME")
                .unwrap_or_else(|_| "tapad-rtd".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_format: std::env::var("TAPAD_RTD_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(LogFormat::Pretty),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to init subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// Should be called once at startup. Fails if a subscriber is already
/// installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(
        service_name = config.service_name,
        service_version = config.service_version,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
