//! Storage key names for the envelope cache record.
//!
//! All four keys share one prefix. The default prefix matches the name the
//! submodule registers under, so one store holds exactly one record per
//! prefix.

use tapad_rtd_core::SUBMODULE_NAME;

/// Value written under the no-track key.
pub const NO_TRACK_FLAG: &str = "no_track";

/// The four keys of a cache record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeys {
    data: String,
    expiration: String,
    stale: String,
    no_track: String,
}

impl CacheKeys {
    /// Keys under a custom prefix, e.g. `tapad_rtd` → `tapad_rtd_data`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            data: format!("{}_data", prefix),
            expiration: format!("{}_expiration", prefix),
            stale: format!("{}_stale", prefix),
            no_track: format!("{}_no_track", prefix),
        }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    pub fn stale(&self) -> &str {
        &self.stale
    }

    pub fn no_track(&self) -> &str {
        &self.no_track
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::with_prefix(SUBMODULE_NAME)
    }
}
