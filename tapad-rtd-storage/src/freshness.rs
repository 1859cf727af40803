//! Freshness rules for the envelope cache.
//!
//! A bidding cycle reads the cache record once and turns it into a
//! [`CycleDecision`]: whether to refresh the record in the background and
//! whether the cached envelope may be merged into the current request.
//! Refreshing and merging are independent; a stale record is refreshed
//! *and* still used.

use tapad_rtd_core::{has_passed, Timestamp};

use super::record::CacheRecord;

/// Freshness of a cache record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// Neither an envelope nor a no-track flag has been stored yet.
    Missing,
    /// The expiry boundary has passed. Cached data must not be used.
    Expired,
    /// The stale boundary has passed. Cached data is usable but due for a
    /// background refresh.
    Stale,
    /// Within both boundaries.
    Fresh,
}

impl Freshness {
    /// Whether this state calls for a background fetch.
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Fresh)
    }

    /// Whether cached content may be used in this state.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Stale | Self::Fresh)
    }
}

/// What a bidding cycle should do with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDecision {
    pub freshness: Freshness,
    /// Merge the cached envelope into the request.
    pub alter_bids: bool,
}

impl CycleDecision {
    /// Whether a background fetch should be started.
    pub fn should_fetch(&self) -> bool {
        self.freshness.needs_refresh()
    }
}

impl CacheRecord {
    /// Classify this record at `now`.
    ///
    /// A record with neither data nor a no-track flag is missing whatever
    /// its boundaries say. Expiry is checked before staleness, so a record
    /// whose stale boundary lies after its expiry boundary is simply expired.
    pub fn freshness(&self, now: Timestamp) -> Freshness {
        if !self.is_no_track() && self.data.is_none() {
            Freshness::Missing
        } else if has_passed(now, self.expiration.as_deref()) {
            Freshness::Expired
        } else if has_passed(now, self.stale.as_deref()) {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

/// Decide fetch and alteration for one cycle.
pub fn decide(record: &CacheRecord, now: Timestamp) -> CycleDecision {
    let freshness = record.freshness(now);
    let alter_bids = freshness.is_usable() && !record.is_no_track();
    CycleDecision {
        freshness,
        alter_bids,
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn boundary(now: Timestamp, offset_secs: i64) -> Option<String> {
        Some((now + Duration::seconds(offset_secs)).timestamp_millis().to_string())
    }

    /// Current time truncated to whole milliseconds, the precision boundaries are stored at.
    fn now_ms() -> Timestamp {
        chrono::DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Past the expiry boundary a cycle never alters bids and always fetches.
        #[test]
        fn prop_expired_never_alters(
            expired_for in 1i64..100_000,
            stale in -100_000i64..100_000,
            has_data in any::<bool>(),
            no_track in any::<bool>(),
        ) {
            let now = now_ms();
            let record = CacheRecord {
                data: has_data.then(|| "[]".to_string()),
                expiration: boundary(now, -expired_for),
                stale: boundary(now, stale),
                no_track: no_track.then(|| "no_track".to_string()),
            };
            let decision = decide(&record, now);
            prop_assert!(decision.should_fetch());
            prop_assert!(!decision.alter_bids);
            let expected = if has_data || no_track { Freshness::Expired } else { Freshness::Missing };
            prop_assert_eq!(decision.freshness, expected);
        }

        /// A live no-track record never alters bids and fetches only once stale.
        #[test]
        fn prop_no_track_never_alters(
            expires_in in 1i64..100_000,
            stale in -100_000i64..100_000,
        ) {
            let now = now_ms();
            let record = CacheRecord {
                data: None,
                expiration: boundary(now, expires_in),
                stale: boundary(now, stale),
                no_track: Some("no_track".to_string()),
            };
            let decision = decide(&record, now);
            prop_assert!(!decision.alter_bids);
            prop_assert_eq!(decision.should_fetch(), stale < 0);
        }

        /// Within both boundaries with data present, bids are altered and nothing is fetched.
        #[test]
        fn prop_fresh_data_alters_without_fetch(
            stale_in in 1i64..100_000,
            extra in 0i64..100_000,
        ) {
            let now = now_ms();
            let record = CacheRecord {
                data: Some("[]".to_string()),
                expiration: boundary(now, stale_in + extra),
                stale: boundary(now, stale_in),
                no_track: None,
            };
            let decision = decide(&record, now);
            prop_assert!(decision.alter_bids);
            prop_assert!(!decision.should_fetch());
        }
    }
}
