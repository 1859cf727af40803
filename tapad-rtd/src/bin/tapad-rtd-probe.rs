//! Runs two enrichment cycles against the envelope service and prints the
//! resulting bidder fragments.
//!
//! The first cycle finds an empty cache and starts a refresh; the probe
//! waits for it, then the second cycle merges whatever was stored.

use std::process::ExitCode;
use std::sync::Arc;

use tapad_rtd::{
    init_tracing, BidRequest, EnvelopeCache, HttpTransport, InMemoryStore, ProbeConfig,
    RtdSubmodule, SubmoduleRegistry, TapadRtdSubmodule, TelemetryConfig,
};
use tokio::runtime::Handle;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing(&TelemetryConfig::default()) {
        eprintln!("{}", e);
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(reason = %e, "probe failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProbeConfig::load()?;
    let consent = config.user_consent();

    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(HttpTransport::new(config.transport_config())?);
    let cache = EnvelopeCache::new(store.clone(), transport, Handle::current());
    let submodule = Arc::new(TapadRtdSubmodule::new(cache));

    let mut registry = SubmoduleRegistry::new();
    if !registry.register(submodule.clone(), config.params.clone(), consent.as_ref()) {
        return Err("submodule declined to initialize".into());
    }

    let mut request = BidRequest::new();
    let altered = registry.get_bid_request_data(&mut request, Box::new(|| {}), consent.as_ref());
    info!(altered = ?altered, "first cycle");

    if let Some(fetch) = submodule.take_pending_fetch() {
        let outcome = fetch.wait().await;
        info!(outcome = ?outcome, "refresh finished");
    }

    let altered = registry.get_bid_request_data(&mut request, Box::new(|| {}), consent.as_ref());
    info!(
        altered = ?altered,
        submodule = submodule.name(),
        cached_keys = store.len(),
        "second cycle"
    );

    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
