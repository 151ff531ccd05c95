use thiserror::Error;

use crate::client::ClientError;
use crate::codec::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Malformed input or malformed stored payload.
    #[error("validation failed{}: {}", for_id(.id), .reasons.join("; "))]
    Validation {
        id: Option<String>,
        reasons: Vec<String>,
    },
    #[error("record not found: {id}")]
    NotFound { id: String },
    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("concurrent write detected for record {id} (expected version {expected}, got {actual:?}) after {attempts} attempts")]
    Conflict {
        id: String,
        expected: u64,
        actual: Option<u64>,
        attempts: u32,
    },
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Transport(#[from] ClientError),
}

fn for_id(id: &Option<String>) -> String {
    id.as_deref().map(|id| format!(" for {}", id)).unwrap_or_default()
}

impl RepositoryError {
    pub(crate) fn validation(id: Option<&str>, reasons: Vec<String>) -> Self {
        RepositoryError::Validation {
            id: id.map(str::to_string),
            reasons,
        }
    }

    pub(crate) fn decode(id: &str, err: DecodeError) -> Self {
        Self::validation(Some(id), err.reasons)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<DecodeError> for RepositoryError {
    fn from(err: DecodeError) -> Self {
        RepositoryError::validation(None, err.reasons)
    }
}
