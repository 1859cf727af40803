//! Fuzz test for envelope URL construction
//!
//! Interprets the input as newline-separated fields (account id, US privacy
//! string, then `type=value` identity hints) and checks that every value
//! survives percent-encoding.
//!
//! Run with: cargo +nightly fuzz run query_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapad_rtd_client::{build_query_string, envelope_url};
use tapad_rtd_core::{RtdConfig, UserConsent};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut lines = input.split('\n');
    let account = lines.next().unwrap_or_default();
    let usp = lines.next().filter(|s| !s.is_empty());

    let mut config = RtdConfig::new(account);
    let mut expected_ids = 0;
    for line in lines {
        if let Some((id_type, value)) = line.split_once('=') {
            if !id_type.is_empty() && !id_type.contains(['&', '=']) {
                config = config.with_id(id_type, value);
            }
        }
    }
    for value in config.ids.values() {
        expected_ids += value.values().count();
    }

    let consent = usp.map(|usp| UserConsent::default().with_usp(usp));
    let query = build_query_string(&config, consent.as_ref());

    let pairs: Vec<&str> = query.as_deref().map(|q| q.split('&').collect()).unwrap_or_default();
    assert_eq!(pairs.len(), expected_ids + usize::from(usp.is_some()));
    for pair in pairs {
        let (_, value) = pair.split_once('=').expect("every pair has a value");
        assert!(!value.contains(['&', '=', ' ']));
    }

    match envelope_url(&config, consent.as_ref()) {
        Ok(url) => assert!(!account.is_empty() && url.contains("/acc/")),
        Err(_) => assert!(account.is_empty()),
    }
});
