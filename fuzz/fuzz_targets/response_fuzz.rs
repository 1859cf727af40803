//! Fuzz test for envelope response handling
//!
//! Feeds arbitrary bodies through parsing, the cache record write path and
//! the freshness decision, looking for panics.
//!
//! Run with: cargo +nightly fuzz run response_fuzz -- -max_total_time=60

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use tapad_rtd_core::EnvelopeResponse;
use tapad_rtd_storage::{decide, CacheRecordStore, InMemoryStore, StoredOutcome};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(response) = EnvelopeResponse::parse(body) else {
        return;
    };

    let records = CacheRecordStore::new(Arc::new(InMemoryStore::new()));
    let outcome = records
        .store_response(&response)
        .expect("in-memory store never fails");

    let record = records.load().expect("in-memory store never fails");
    match outcome {
        StoredOutcome::NoTrack => {
            assert!(record.is_no_track());
            assert!(record.data.is_none());
        }
        StoredOutcome::Envelope { entries } => {
            assert!(!record.is_no_track());
            assert_eq!(record.envelope().map(|e| e.len()).unwrap_or(0), entries);
        }
    }

    // Decision must be total over whatever boundaries the body carried.
    let decision = decide(&record, chrono::Utc::now());
    if decision.alter_bids {
        assert!(!record.is_no_track());
    }
});
