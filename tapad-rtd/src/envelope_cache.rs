//! The envelope cache: cycle evaluation, background refresh and request
//! enrichment over a host key-value store.

use std::sync::Arc;

use tapad_rtd_client::{envelope_url, EnvelopeTransport};
use tapad_rtd_core::{
    BidRequest, Clock, EnvelopeResponse, RtdConfig, RtdResult, SystemClock, Timestamp,
    UserConsent,
};
use tapad_rtd_storage::{
    decide, CacheKeys, CacheRecord, CacheRecordStore, CycleDecision, KeyValueStore,
    StoredOutcome,
};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::background::BackgroundFetch;

/// Result of evaluating the cache for one bidding cycle.
#[derive(Debug)]
pub struct Evaluation {
    /// Merge the cached envelope into the current request.
    pub should_alter_bids: bool,
    /// Freshness and alteration as decided from the stored record.
    pub decision: CycleDecision,
    /// Refresh started by this evaluation, if any.
    pub fetch: Option<BackgroundFetch>,
}

/// Cached data envelope shared by every bidding cycle of a host.
///
/// Cloning is cheap; clones share the store, transport and clock.
#[derive(Clone)]
pub struct EnvelopeCache {
    records: CacheRecordStore,
    transport: Arc<dyn EnvelopeTransport>,
    runtime: Handle,
    clock: Arc<dyn Clock>,
}

impl EnvelopeCache {
    /// Cache over `store` fetching through `transport`.
    ///
    /// Refreshes are spawned onto `runtime`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn EnvelopeTransport>,
        runtime: Handle,
    ) -> Self {
        Self {
            records: CacheRecordStore::new(store),
            transport,
            runtime,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use different key names in the same store.
    pub fn with_keys(mut self, keys: CacheKeys) -> Self {
        self.records = CacheRecordStore::with_keys(Arc::clone(self.records.store()), keys);
        self
    }

    pub fn records(&self) -> &CacheRecordStore {
        &self.records
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Whether the submodule can run with `config`.
    pub fn init(&self, config: &RtdConfig) -> bool {
        let enabled = config.is_enabled();
        if enabled {
            debug!(account_id = ?config.account_id, "tapad rtd enabled");
        } else {
            warn!("tapad rtd disabled: accountId is missing or empty");
        }
        enabled
    }

    /// [`evaluate_and_maybe_fetch`] at the clock's current instant.
    ///
    /// [`evaluate_and_maybe_fetch`]: EnvelopeCache::evaluate_and_maybe_fetch
    pub fn evaluate(&self, config: &RtdConfig, consent: Option<&UserConsent>) -> Evaluation {
        self.evaluate_and_maybe_fetch(config, consent, self.now())
    }

    /// Decide whether to refresh and whether to alter bids.
    ///
    /// Never waits on the network. A refresh, when due, is spawned and its
    /// handle returned in the evaluation. An unreadable store counts as an
    /// empty cache.
    pub fn evaluate_and_maybe_fetch(
        &self,
        config: &RtdConfig,
        consent: Option<&UserConsent>,
        now: Timestamp,
    ) -> Evaluation {
        let record = self.records.load().unwrap_or_else(|e| {
            warn!(reason = %e, "failed to read envelope cache");
            CacheRecord::default()
        });

        let decision = decide(&record, now);
        debug!(
            freshness = ?decision.freshness,
            alter_bids = decision.alter_bids,
            no_track = record.is_no_track(),
            "evaluated envelope cache"
        );

        let fetch = decision
            .should_fetch()
            .then(|| self.spawn_fetch(config, consent));

        Evaluation {
            should_alter_bids: decision.alter_bids,
            decision,
            fetch,
        }
    }

    /// Merge the cached envelope into `request` for every configured
    /// bidder.
    ///
    /// Returns the bidders whose fragment was merged. A missing or
    /// unreadable envelope merges nothing.
    pub fn apply_to_request(&self, request: &mut BidRequest, config: &RtdConfig) -> Vec<String> {
        let envelope = match self.records.load_envelope() {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                debug!("no cached envelope to merge");
                return Vec::new();
            }
            Err(e) => {
                warn!(reason = %e, "failed to read cached envelope");
                return Vec::new();
            }
        };

        let touched = request.apply_envelope(&envelope, &config.bidders);
        debug!(bidders = ?touched, "merged envelope into bid request");
        touched
    }

    /// Start a refresh without waiting for it.
    ///
    /// Failures are logged inside the task and never reach the caller.
    pub fn spawn_fetch(&self, config: &RtdConfig, consent: Option<&UserConsent>) -> BackgroundFetch {
        let cache = self.clone();
        let config = config.clone();
        let consent = consent.cloned();

        let handle = self.runtime.spawn(async move {
            match cache.fetch_and_store(&config, consent.as_ref()).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(
                        account_id = ?config.account_id,
                        reason = %e,
                        "envelope refresh failed; cache left unchanged"
                    );
                    None
                }
            }
        });
        BackgroundFetch::new(handle)
    }

    /// Fetch the envelope and write it to the cache.
    ///
    /// Nothing is written unless the response parses.
    pub async fn fetch_and_store(
        &self,
        config: &RtdConfig,
        consent: Option<&UserConsent>,
    ) -> RtdResult<StoredOutcome> {
        let url = envelope_url(config, consent)?;
        debug!(url = %url, "fetching envelope");

        let body = self.transport.get(&url).await?;
        let response = EnvelopeResponse::parse(&body)?;
        let outcome = self.records.store_response(&response)?;

        match outcome {
            StoredOutcome::Envelope { entries } => info!(
                account_id = ?config.account_id,
                entries,
                stale_at = ?response.stale_at,
                expires_at = ?response.expires_at,
                "stored envelope"
            ),
            StoredOutcome::NoTrack => info!(
                account_id = ?config.account_id,
                expires_at = ?response.expires_at,
                "stored no-track flag"
            ),
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for EnvelopeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCache")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
