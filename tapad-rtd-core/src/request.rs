//! Outgoing bid request fragments.

use crate::merge::{deep_merge, merge_object};
use crate::DataEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The part of a host bid request this submodule may modify: first-party
/// data fragments keyed by bidder code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    #[serde(default)]
    pub bidder_fragments: Map<String, Value>,
}

impl BidRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment for a bidder, if one exists.
    pub fn fragment(&self, bidder: &str) -> Option<&Value> {
        self.bidder_fragments.get(bidder)
    }

    /// Deep-merge `data` into the fragment of `bidder`.
    pub fn merge_bidder_fragment(&mut self, bidder: &str, data: &Value) {
        match self.bidder_fragments.get_mut(bidder) {
            Some(existing) => deep_merge(existing, data),
            None => {
                self.bidder_fragments.insert(bidder.to_string(), data.clone());
            }
        }
    }

    /// Merge the envelope entry of every listed bidder, in order.
    ///
    /// Returns the bidders whose fragment was touched.
    pub fn apply_envelope<'a, I>(&mut self, envelope: &DataEnvelope, bidders: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut touched = Vec::new();
        for bidder in bidders {
            if let Some(entry) = envelope.find(bidder) {
                self.merge_bidder_fragment(bidder, &entry.data);
                touched.push(bidder.clone());
            }
        }
        touched
    }

    /// Merge a whole bidder → fragment map at once.
    pub fn merge_fragments(&mut self, fragments: &Map<String, Value>) {
        merge_object(&mut self.bidder_fragments, fragments);
    }
}
