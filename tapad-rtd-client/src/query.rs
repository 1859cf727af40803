//! Query string for the envelope request.
//!
//! Two segments: consent (`gdpr`, `gdpr_consent`, `us_privacy`) followed by
//! identity hints (`id.<type>=<value>`, one pair per value). Values are
//! percent-encoded; parameter names are emitted as-is.

use tapad_rtd_core::{RtdConfig, UserConsent};

/// Build the query string (without the leading `?`).
///
/// Returns `None` when neither segment has any pair.
pub fn build_query_string(config: &RtdConfig, consent: Option<&UserConsent>) -> Option<String> {
    let segments: Vec<String> = [consent_segment(consent), ids_segment(config)]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("&"))
    }
}

/// `gdpr=..&gdpr_consent=..&us_privacy=..`, skipping absent fields.
pub fn consent_segment(consent: Option<&UserConsent>) -> String {
    let Some(consent) = consent else {
        return String::new();
    };

    let mut pairs = Vec::new();
    if let Some(gdpr) = &consent.gdpr {
        if let Some(applies) = gdpr.gdpr_applies {
            pairs.push(pair("gdpr", if applies { "true" } else { "false" }));
        }
        if let Some(consent_string) = &gdpr.consent_string {
            pairs.push(pair("gdpr_consent", consent_string));
        }
    }
    if let Some(usp) = &consent.usp_consent {
        pairs.push(pair("us_privacy", usp));
    }
    pairs.join("&")
}

/// `id.<type>=<value>` for every configured id value, in order.
pub fn ids_segment(config: &RtdConfig) -> String {
    config
        .ids
        .iter()
        .flat_map(|(id_type, value)| {
            let name = format!("id.{}", id_type);
            value
                .values()
                .map(move |v| pair(&name, v))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn pair(name: &str, value: &str) -> String {
    format!("{}={}", name, urlencoding::encode(value))
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use tapad_rtd_core::{GdprConsent, IdHints, IdValue};

    fn parse_query(query: &str) -> Vec<(String, String)> {
        query
            .split('&')
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    name.to_string(),
                    urlencoding::decode(value).unwrap().into_owned(),
                )
            })
            .collect()
    }

    fn arb_consent() -> impl Strategy<Value = UserConsent> {
        (
            proptest::option::of((any::<bool>(), ".{1,20}")),
            proptest::option::of("[0-9A-Z-]{4}"),
        )
            .prop_map(|(gdpr, usp)| UserConsent {
                gdpr: gdpr.map(|(applies, consent_string)| GdprConsent {
                    gdpr_applies: Some(applies),
                    consent_string: Some(consent_string),
                }),
                usp_consent: usp,
            })
    }

    fn arb_ids() -> impl Strategy<Value = IdHints> {
        let value = prop_oneof![
            ".{1,16}".prop_map(IdValue::Single),
            prop::collection::vec(".{1,16}", 1..4).prop_map(IdValue::Multiple),
        ];
        prop::collection::vec(("[a-z]{1,8}", value), 0..4)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Parsing the query reconstructs consent and ids.
        #[test]
        fn prop_query_roundtrip(consent in arb_consent(), ids in arb_ids()) {
            let mut config = RtdConfig::new("abc");
            config.ids = ids.clone();

            let query = build_query_string(&config, Some(&consent));
            let pairs = query.as_deref().map(parse_query).unwrap_or_default();

            let lookup = |name: &str| -> Vec<String> {
                pairs.iter().filter(|(n, _)| n == name).map(|(_, v)| v.clone()).collect()
            };

            match &consent.gdpr {
                Some(gdpr) => {
                    prop_assert_eq!(lookup("gdpr"), vec![gdpr.gdpr_applies.unwrap().to_string()]);
                    prop_assert_eq!(lookup("gdpr_consent"), vec![gdpr.consent_string.clone().unwrap()]);
                }
                None => {
                    prop_assert!(lookup("gdpr").is_empty());
                    prop_assert!(lookup("gdpr_consent").is_empty());
                }
            }
            prop_assert_eq!(lookup("us_privacy"), consent.usp_consent.clone().into_iter().collect::<Vec<_>>());

            for (id_type, value) in ids.iter() {
                let expected: Vec<String> = value.values().map(str::to_string).collect();
                prop_assert_eq!(lookup(&format!("id.{}", id_type)), expected);
            }

            let id_pairs = pairs.iter().filter(|(n, _)| n.starts_with("id.")).count();
            let id_values: usize = ids.values().map(|v| v.values().count()).sum();
            prop_assert_eq!(id_pairs, id_values);

            let id_types: Vec<&str> = pairs
                .iter()
                .filter_map(|(n, _)| n.strip_prefix("id."))
                .collect();
            let mut expected_types: Vec<&str> = Vec::new();
            for (id_type, value) in ids.iter() {
                expected_types.extend(std::iter::repeat(id_type).take(value.values().count()));
            }
            prop_assert_eq!(id_types, expected_types);
            prop_assert_eq!(query.is_none(), consent.is_empty() && id_values == 0);
        }
    }
}
