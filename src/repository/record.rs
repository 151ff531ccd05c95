use serde::{Deserialize, Serialize};

use super::RecordData;

/// Trait for domain types stored as versioned state records.
pub trait StateRecord: RecordData {
    /// The state event type this record kind is stored under
    /// (e.g. "fi.nor.device", "com.example.user").
    const STATE_TYPE: &'static str;
}

/// A record as returned by the repository: container id plus the decoded
/// payload of its state slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry<T> {
    pub id: String,
    pub data: T,
    pub version: u64,
    #[serde(default)]
    pub deleted: bool,
}

impl<T> RecordEntry<T> {
    pub fn new(id: impl Into<String>, data: T, version: u64, deleted: bool) -> Self {
        Self {
            id: id.into(),
            data,
            version,
            deleted,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
