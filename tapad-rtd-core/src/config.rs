//! Submodule configuration types

use crate::{ConfigError, RtdResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// Default base URL of the envelope service.
pub const DEFAULT_ENDPOINT: &str = "https://rtid.tapad.com";

/// Identity hint value: a single id or several ids of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Single(String),
    Multiple(Vec<String>),
}

impl IdValue {
    /// Iterate over the contained values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for IdValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<&str>> for IdValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Identity hints keyed by id type, kept in the order the host listed them.
///
/// Inserting an existing type replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdHints(Vec<(String, IdValue)>);

impl IdHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id_type: impl Into<String>, value: IdValue) {
        let id_type = id_type.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == id_type) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((id_type, value)),
        }
    }

    pub fn get(&self, id_type: &str) -> Option<&IdValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == id_type)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IdValue)> {
        self.0.iter().map(|(id_type, value)| (id_type.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &IdValue> {
        self.0.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for IdHints {
    type Output = IdValue;

    fn index(&self, id_type: &str) -> &IdValue {
        match self.get(id_type) {
            Some(value) => value,
            None => panic!("no id hint of type {id_type}"),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, IdValue)> for IdHints {
    fn from_iter<I: IntoIterator<Item = (K, IdValue)>>(iter: I) -> Self {
        let mut hints = Self::new();
        for (id_type, value) in iter {
            hints.insert(id_type, value);
        }
        hints
    }
}

impl Serialize for IdHints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id_type, value) in &self.0 {
            map.serialize_entry(id_type, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IdHints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HintsVisitor;

        impl<'de> Visitor<'de> for HintsVisitor {
            type Value = IdHints;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of id type to id value(s)")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<IdHints, A::Error> {
                let mut hints = IdHints::new();
                while let Some((id_type, value)) = access.next_entry::<String, IdValue>()? {
                    hints.insert(id_type, value);
                }
                Ok(hints)
            }
        }

        deserializer.deserialize_map(HintsVisitor)
    }
}

/// Submodule parameters as supplied by the host.
///
/// Deserializes from the host's camelCase JSON params. `accountId` is kept
/// only when it is a JSON string; any other type is dropped so that `init`
/// can reject the config instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtdConfig {
    #[serde(default, deserialize_with = "string_or_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub bidders: Vec<String>,
    #[serde(default)]
    pub ids: IdHints,
    /// Base URL override, mostly for testing against a local server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl RtdConfig {
    /// Create a config for the given account with no bidders or ids.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn with_bidders<I, S>(mut self, bidders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bidders = bidders.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id_type: impl Into<String>, value: impl Into<IdValue>) -> Self {
        self.ids.insert(id_type.into(), value.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Parse host params, e.g. the `params` object of a submodule entry.
    pub fn from_value(value: serde_json::Value) -> RtdResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            ConfigError::InvalidValue {
                field: "params".to_string(),
                value: "<json>".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Whether the submodule may run: `accountId` is a non-empty string.
    pub fn is_enabled(&self) -> bool {
        self.account_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Account id, or an error naming the missing field.
    pub fn require_account_id(&self) -> RtdResult<&str> {
        match self.account_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ConfigError::MissingRequired {
                field: "accountId".to_string(),
            }
            .into()),
        }
    }

    /// Base URL without trailing slash.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - accountId is a non-empty string
    /// - endpoint, when set, is an http(s) URL
    pub fn validate(&self) -> RtdResult<()> {
        self.require_account_id()?;

        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    field: "endpoint".to_string(),
                    value: endpoint.clone(),
                    reason: "must be an http(s) URL".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}
