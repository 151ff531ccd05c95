//! Sync filter and response shapes, using the remote protocol's field names.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One state observation: `{ type, state_key, content }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub state_key: String,
    pub content: Value,
}

impl StateEvent {
    pub fn new(event_type: impl Into<String>, state_key: impl Into<String>, content: Value) -> Self {
        Self {
            event_type: event_type.into(),
            state_key: state_key.into(),
            content,
        }
    }
}

/// Limit for an event stream the caller has no use for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl EventFilter {
    pub fn none() -> Self {
        Self { limit: Some(0) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub include_redundant_members: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_types: Vec<String>,
}

impl StateFilter {
    /// Whether an event type passes the `types` / `not_types` lists.
    pub fn admits(&self, event_type: &str) -> bool {
        if self.not_types.iter().any(|t| t == event_type) {
            return false;
        }
        self.types.is_empty() || self.types.iter().any(|t| t == event_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerFilter {
    #[serde(default)]
    pub account_data: EventFilter,
    #[serde(default)]
    pub timeline: EventFilter,
    #[serde(default)]
    pub state: StateFilter,
}

/// Filter for a bulk synchronization request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncFilter {
    #[serde(default)]
    pub presence: EventFilter,
    #[serde(default)]
    pub account_data: EventFilter,
    #[serde(default, rename = "room")]
    pub container: ContainerFilter,
    #[serde(default)]
    pub full_state: bool,
}

impl SyncFilter {
    /// Current state of one record type across every joined container:
    /// no timeline, presence or account data, one state result per type,
    /// tombstone type excluded.
    pub fn for_records(state_type: &str, deleted_type: &str) -> Self {
        Self {
            presence: EventFilter::none(),
            account_data: EventFilter::none(),
            container: ContainerFilter {
                account_data: EventFilter::none(),
                timeline: EventFilter::none(),
                state: StateFilter {
                    limit: Some(1),
                    include_redundant_members: true,
                    types: vec![state_type.to_string()],
                    not_types: vec![deleted_type.to_string()],
                },
            },
            full_state: true,
        }
    }
}

/// State seen for one joined container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinedContainer {
    #[serde(default)]
    pub state_events: Vec<StateEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub containers: IndexMap<String, JoinedContainer>,
}
