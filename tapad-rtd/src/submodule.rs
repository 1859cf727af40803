//! Host plugin contract and the Tapad implementation of it.

use std::sync::Mutex;

use tapad_rtd_core::{BidRequest, RtdConfig, UserConsent, SUBMODULE_NAME};
use tracing::debug;

use crate::background::BackgroundFetch;
use crate::envelope_cache::EnvelopeCache;

/// Completion callback handed to a submodule for one bidding cycle.
pub type DoneCallback = Box<dyn FnOnce() + Send>;

/// Real-time data submodule as seen by the host.
///
/// # Example
/// ```ignore
/// struct MySubmodule;
///
/// impl RtdSubmodule for MySubmodule {
///     fn name(&self) -> &str { "mine" }
///     fn init(&self, _: &RtdConfig, _: Option<&UserConsent>) -> bool { true }
///     fn get_bid_request_data(&self, _: &mut BidRequest, done: DoneCallback,
///                             _: &RtdConfig, _: Option<&UserConsent>) -> bool {
///         done();
///         false
///     }
/// }
/// ```
pub trait RtdSubmodule: Send + Sync {
    fn name(&self) -> &str;

    /// Return `false` to be left unregistered.
    fn init(&self, config: &RtdConfig, consent: Option<&UserConsent>) -> bool;

    /// Enrich `request` for this cycle.
    ///
    /// `done` must be called exactly once. Returns whether the cached
    /// envelope was applied to the request this cycle, even when no
    /// configured bidder matched.
    fn get_bid_request_data(
        &self,
        request: &mut BidRequest,
        done: DoneCallback,
        config: &RtdConfig,
        consent: Option<&UserConsent>,
    ) -> bool;
}

/// The Tapad submodule: evaluates the envelope cache each cycle and merges
/// the cached envelope when allowed.
#[derive(Debug)]
pub struct TapadRtdSubmodule {
    cache: EnvelopeCache,
    pending: Mutex<Option<BackgroundFetch>>,
}

impl TapadRtdSubmodule {
    pub fn new(cache: EnvelopeCache) -> Self {
        Self {
            cache,
            pending: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &EnvelopeCache {
        &self.cache
    }

    /// The most recent refresh started by a cycle, if it has not been
    /// taken yet. Earlier unclaimed refreshes keep running detached.
    pub fn take_pending_fetch(&self) -> Option<BackgroundFetch> {
        self.pending.lock().ok().and_then(|mut slot| slot.take())
    }

    fn remember(&self, fetch: BackgroundFetch) {
        match self.pending.lock() {
            Ok(mut slot) => {
                if let Some(previous) = slot.replace(fetch) {
                    previous.detach();
                }
            }
            Err(_) => fetch.detach(),
        }
    }
}

impl RtdSubmodule for TapadRtdSubmodule {
    fn name(&self) -> &str {
        SUBMODULE_NAME
    }

    fn init(&self, config: &RtdConfig, _consent: Option<&UserConsent>) -> bool {
        self.cache.init(config)
    }

    fn get_bid_request_data(
        &self,
        request: &mut BidRequest,
        done: DoneCallback,
        config: &RtdConfig,
        consent: Option<&UserConsent>,
    ) -> bool {
        let evaluation = self.cache.evaluate(config, consent);
        if let Some(fetch) = evaluation.fetch {
            self.remember(fetch);
        }

        let altered = evaluation.should_alter_bids;
        if altered {
            let touched = self.cache.apply_to_request(request, config);
            debug!(bidders = ?touched, "tapad rtd cycle complete");
        } else {
            debug!(altered, "tapad rtd cycle complete");
        }

        done();
        altered
    }
}
