//! Soft delete as a resumable sequence of idempotent steps.
//!
//! Deleting a record takes three independent remote calls: flag the record
//! deleted (bumping its version), write the tombstone marker, forget the
//! container. Nothing makes them atomic, so each step first checks whether
//! it already happened. Calling `delete_by_id` again after a partial
//! failure finishes the remaining steps without bumping the version twice.

use std::fmt;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{RecordData, RecordEntry, RepositoryError, StateRepository};
use crate::client::StateClient;
use crate::codec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    MarkDeleted,
    Tombstone,
    Forget,
}

impl fmt::Display for DeleteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteStep::MarkDeleted => write!(f, "mark-deleted"),
            DeleteStep::Tombstone => write!(f, "tombstone"),
            DeleteStep::Forget => write!(f, "forget"),
        }
    }
}

impl<C: StateClient, T: RecordData> StateRepository<C, T> {
    /// Soft-delete a record: flag it, tombstone it, forget its container.
    ///
    /// Returns the record with `deleted = true` at the version the flag was
    /// written with. Errors from any step propagate unchanged and leave the
    /// earlier steps applied.
    pub async fn delete_by_id(&self, id: &str) -> Result<RecordEntry<T>, RepositoryError> {
        let (current, version) = self
            .write_next_version(id, |current, next| {
                if current.deleted {
                    debug!(container = %id, version = current.version, "record already flagged deleted");
                    return Ok(None);
                }
                let data = codec::encode_data(&current.data).map_err(|e| RepositoryError::decode(id, e))?;
                Ok(Some(codec::encode(data, next, true).to_content()))
            })
            .await
            .map_err(|err| interrupted(id, DeleteStep::MarkDeleted, err))?;

        self.write_tombstone(id)
            .await
            .map_err(|err| interrupted(id, DeleteStep::Tombstone, err))?;

        self.client()
            .forget_container(id)
            .await
            .map_err(|err| interrupted(id, DeleteStep::Forget, err.into()))?;

        info!(container = %id, version, "record deleted");
        Ok(RecordEntry::new(id, current.data, version, true))
    }

    /// Delete each listed record in order, stopping at the first failure.
    pub async fn delete_by_list(
        &self,
        entries: &[RecordEntry<T>],
    ) -> Result<Vec<RecordEntry<T>>, RepositoryError> {
        let mut deleted = Vec::with_capacity(entries.len());
        for entry in entries {
            deleted.push(self.delete_by_id(&entry.id).await?);
        }
        Ok(deleted)
    }

    /// Delete every live record the sync feed currently lists.
    pub async fn delete_all(&self) -> Result<Vec<RecordEntry<T>>, RepositoryError> {
        let entries = self.get_all_latest().await?;
        self.delete_by_list(&entries).await
    }

    async fn write_tombstone(&self, id: &str) -> Result<(), RepositoryError> {
        let config = self.config();
        let existing = self
            .client()
            .get_state(id, &config.deleted_type, &config.deleted_key)
            .await?;

        if existing.is_some() {
            debug!(container = %id, "tombstone already present");
            return Ok(());
        }

        self.client()
            .put_state(id, &config.deleted_type, &config.deleted_key, empty_content())
            .await?;
        Ok(())
    }
}

fn empty_content() -> Value {
    json!({})
}

fn interrupted(id: &str, step: DeleteStep, err: RepositoryError) -> RepositoryError {
    // Not-found before anything was written is an ordinary miss.
    if step != DeleteStep::MarkDeleted || !err.is_not_found() {
        warn!(container = %id, %step, error = %err, "delete interrupted, retry delete_by_id to resume");
    }
    err
}
