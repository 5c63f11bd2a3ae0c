//! Sandwich classification tags, keyed by `"{txId} {eventType}"`.
//!
//! Tags are assigned offline (by hand or by an external detector) on a
//! timeline export, extracted into the index file, and looked up by the
//! collector on the next run.

use crate::event::{EventType, UnifiedEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Not part of a sandwich
pub const UNTAGGED: u8 = 0;
/// Front-running leg
pub const FRONT_RUN: u8 = 1;
/// Victim swap
pub const VICTIM: u8 = 5;
/// Back-running leg
pub const BACK_RUN: u8 = 9;
/// Highest value of the reserved tag range
pub const MAX_TAG: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandwichError {
    #[error("tag {tag} for {key:?} is outside 0..=9")]
    TagOutOfRange { key: String, tag: u8 },
}

/// Read-only lookup of sandwich tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct SandwichTagIndex {
    tags: BTreeMap<String, u8>,
}

impl SandwichTagIndex {
    pub fn key(tx_id: &str, event_type: EventType) -> String {
        format!("{tx_id} {event_type}")
    }

    /// Tag of the event, [`UNTAGGED`] when the index has no entry.
    pub fn lookup(&self, tx_id: &str, event_type: EventType) -> u8 {
        self.tags
            .get(&Self::key(tx_id, event_type))
            .copied()
            .unwrap_or(UNTAGGED)
    }

    /// Collect every tagged event. On key collisions the later event wins.
    pub fn from_events(events: &[UnifiedEvent]) -> Self {
        let tags = events
            .iter()
            .filter(|e| e.sandwich != UNTAGGED)
            .map(|e| (Self::key(&e.tx_id, e.event_type), e.sandwich))
            .collect();
        Self { tags }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl TryFrom<BTreeMap<String, u8>> for SandwichTagIndex {
    type Error = SandwichError;

    fn try_from(tags: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        if let Some((key, tag)) = tags.iter().find(|(_, tag)| **tag > MAX_TAG) {
            return Err(SandwichError::TagOutOfRange {
                key: key.clone(),
                tag: *tag,
            });
        }
        Ok(Self { tags })
    }
}

impl From<SandwichTagIndex> for BTreeMap<String, u8> {
    fn from(index: SandwichTagIndex) -> Self {
        index.tags
    }
}
