//! Host-owned registry of enabled submodules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tapad_rtd_core::{BidRequest, RtdConfig, UserConsent};
use tracing::{info, warn};

use crate::submodule::{DoneCallback, RtdSubmodule};

struct Registration {
    submodule: Arc<dyn RtdSubmodule>,
    config: RtdConfig,
}

/// Registry of real-time data submodules.
///
/// Only submodules whose `init` accepted their configuration are kept.
///
/// # Example
/// ```ignore
/// let mut registry = SubmoduleRegistry::new();
/// registry.register(Arc::new(TapadRtdSubmodule::new(cache)), config, consent.as_ref());
///
/// // Later, once per bidding cycle
/// let altered = registry.get_bid_request_data(&mut request, done, consent.as_ref());
/// ```
pub struct SubmoduleRegistry {
    registrations: Vec<Registration>,
}

impl SubmoduleRegistry {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Initialize `submodule` with `config` and keep it if it accepts.
    ///
    /// Returns whether the submodule was registered.
    pub fn register(
        &mut self,
        submodule: Arc<dyn RtdSubmodule>,
        config: RtdConfig,
        consent: Option<&UserConsent>,
    ) -> bool {
        if !submodule.init(&config, consent) {
            warn!(submodule = submodule.name(), "submodule declined to initialize");
            return false;
        }
        info!(submodule = submodule.name(), "submodule registered");
        self.registrations.push(Registration { submodule, config });
        true
    }

    /// Names of the registered submodules, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|r| r.submodule.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every registered submodule against `request`, in registration
    /// order.
    ///
    /// `done` fires once, after every submodule has called its own
    /// callback. Returns the names of the submodules that altered the
    /// request.
    pub fn get_bid_request_data(
        &self,
        request: &mut BidRequest,
        done: DoneCallback,
        consent: Option<&UserConsent>,
    ) -> Vec<String> {
        if self.registrations.is_empty() {
            done();
            return Vec::new();
        }

        let barrier = DoneBarrier::new(self.registrations.len(), done);
        let mut altered = Vec::new();
        for registration in &self.registrations {
            let submodule = &registration.submodule;
            if submodule.get_bid_request_data(
                request,
                barrier.callback(),
                &registration.config,
                consent,
            ) {
                altered.push(submodule.name().to_string());
            }
        }
        altered
    }
}

impl Default for SubmoduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubmoduleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmoduleRegistry")
            .field("submodules", &self.names())
            .finish()
    }
}

/// Fires the wrapped callback when the last of `count` callbacks runs.
#[derive(Clone)]
struct DoneBarrier {
    remaining: Arc<AtomicUsize>,
    done: Arc<Mutex<Option<DoneCallback>>>,
}

impl DoneBarrier {
    fn new(count: usize, done: DoneCallback) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(count)),
            done: Arc::new(Mutex::new(Some(done))),
        }
    }

    fn callback(&self) -> DoneCallback {
        let barrier = self.clone();
        Box::new(move || barrier.arrive())
    }

    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let done = self.done.lock().ok().and_then(|mut slot| slot.take());
        if let Some(done) = done {
            done();
        }
    }
}
