use std::marker::PhantomData;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{RecordData, RecordEntry, RepositoryError};
use crate::client::{ConditionalPut, CreateContainer, StateClient, StateEvent, SyncFilter};
use crate::codec;
use crate::config::{ConfigError, RepositoryConfig, WritePolicy};
use crate::reducer;
use crate::validate;

/// Version every record starts at.
pub const INITIAL_VERSION: u64 = 1;

/// CRUD repository storing one record per container, in the state slot
/// named by the config.
///
/// Nothing is cached: every read goes to the remote store.
pub struct StateRepository<C, T> {
    client: C,
    config: RepositoryConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<C: StateClient, T: RecordData> StateRepository<C, T> {
    pub fn new(client: C, config: RepositoryConfig) -> Self {
        Self {
            client,
            config,
            _marker: PhantomData,
        }
    }

    /// Like [`new`](Self::new) but rejects an inconsistent config.
    pub fn try_new(client: C, config: RepositoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every record observation the sync feed yields for joined containers.
    ///
    /// Not de-duplicated: a container can contribute several versions of
    /// its record. Use [`get_all_latest`](Self::get_all_latest) or
    /// [`reducer::latest`] for one entry per id.
    pub async fn get_all(&self) -> Result<Vec<RecordEntry<T>>, RepositoryError> {
        let filter = SyncFilter::for_records(&self.config.state_type, &self.config.deleted_type);
        let response = self.client.sync(&filter).await?;

        debug!(
            state_type = %self.config.state_type,
            next_batch = %response.next_batch,
            containers = response.containers.len(),
            "sync response"
        );

        let mut entries = Vec::new();
        for (container, joined) in response.containers {
            for event in joined.state_events {
                if let Some(entry) = self.observation_to_entry(&container, event) {
                    entries.push(entry);
                }
            }
        }

        Ok(entries)
    }

    /// Newest version of every record, deleted ones left out.
    pub async fn get_all_latest(&self) -> Result<Vec<RecordEntry<T>>, RepositoryError> {
        let entries = self.get_all().await?;
        Ok(reducer::latest(entries)
            .into_iter()
            .filter(|entry| !entry.deleted)
            .collect())
    }

    /// Point lookups for each id. Missing and deleted records are skipped.
    pub async fn get_some(&self, ids: &[&str]) -> Result<Vec<RecordEntry<T>>, RepositoryError> {
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.find_by_id(id).await? {
                if !entry.deleted {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    /// Read the record slot of one container.
    ///
    /// `Ok(None)` when the slot does not exist. A slot that exists but is
    /// malformed is an error, never `None`. The tombstone slot is not
    /// consulted; `deleted` comes from the record's own flag.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<RecordEntry<T>>, RepositoryError> {
        self.check_id(id)?;

        let content = self
            .client
            .get_state(id, &self.config.state_type, &self.config.state_key)
            .await?;

        let Some(content) = content else {
            debug!(container = %id, state_type = %self.config.state_type, "no record slot");
            return Ok(None);
        };

        let payload = codec::decode(&content).map_err(|e| RepositoryError::decode(id, e))?;
        let data = codec::decode_data(payload.data).map_err(|e| RepositoryError::decode(id, e))?;

        Ok(Some(RecordEntry::new(id, data, payload.version, payload.deleted)))
    }

    /// Find all live records matching a predicate.
    pub async fn find<F>(&self, predicate: F) -> Result<Vec<RecordEntry<T>>, RepositoryError>
    where
        F: Fn(&RecordEntry<T>) -> bool,
    {
        let entries = self.get_all_latest().await?;
        Ok(entries.into_iter().filter(|entry| predicate(entry)).collect())
    }

    /// Find the first live record matching a predicate.
    pub async fn find_one<F>(&self, predicate: F) -> Result<Option<RecordEntry<T>>, RepositoryError>
    where
        F: Fn(&RecordEntry<T>) -> bool,
    {
        let entries = self.get_all_latest().await?;
        Ok(entries.into_iter().find(|entry| predicate(entry)))
    }

    pub async fn exists<F>(&self, predicate: F) -> Result<bool, RepositoryError>
    where
        F: Fn(&RecordEntry<T>) -> bool,
    {
        Ok(self.find_one(predicate).await?.is_some())
    }

    pub async fn count<F>(&self, predicate: F) -> Result<usize, RepositoryError>
    where
        F: Fn(&RecordEntry<T>) -> bool,
    {
        Ok(self.find(predicate).await?.len())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Allocate a container seeded with the record at version 1.
    pub async fn create(&self, data: T) -> Result<RecordEntry<T>, RepositoryError> {
        let value = codec::encode_data(&data)?;
        let payload = codec::encode(value, INITIAL_VERSION, false);

        let request = CreateContainer {
            preset: self.config.container.preset,
            federate: self.config.container.federate,
            initial_state: vec![StateEvent::new(
                &self.config.state_type,
                &self.config.state_key,
                payload.to_content(),
            )],
        };

        let id = self.client.create_container(&request).await?;
        info!(container = %id, state_type = %self.config.state_type, "record created");

        Ok(RecordEntry::new(id, data, INITIAL_VERSION, false))
    }

    /// Replace the data of an existing record, bumping its version by one.
    pub async fn update(&self, id: &str, data: T) -> Result<RecordEntry<T>, RepositoryError> {
        self.check_id(id)?;
        let value = codec::encode_data(&data).map_err(|e| RepositoryError::decode(id, e))?;

        let (_, version) = self
            .write_next_version(id, |current, next| {
                if current.deleted {
                    return Err(RepositoryError::NotFound { id: id.to_string() });
                }
                Ok(Some(codec::encode(value.clone(), next, false).to_content()))
            })
            .await?;

        debug!(container = %id, version, "record updated");
        Ok(RecordEntry::new(id, data, version, false))
    }

    /// Update `id` when given and present, otherwise create a new record.
    pub async fn update_or_create(
        &self,
        id: Option<&str>,
        data: T,
    ) -> Result<RecordEntry<T>, RepositoryError> {
        if let Some(id) = id {
            match self.update(id, data.clone()).await {
                Err(RepositoryError::NotFound { .. }) => {
                    debug!(container = %id, "no record to update, creating");
                }
                other => return other,
            }
        }
        self.create(data).await
    }

    /// Read-increment-write on the record slot of `id`.
    ///
    /// `build` receives the current record and the next version and returns
    /// the content to write, or `None` to leave the slot as it is. Returns
    /// the record as read and the version the slot holds afterwards.
    pub(super) async fn write_next_version<F>(
        &self,
        id: &str,
        mut build: F,
    ) -> Result<(RecordEntry<T>, u64), RepositoryError>
    where
        F: FnMut(&RecordEntry<T>, u64) -> Result<Option<Value>, RepositoryError>,
    {
        // `None` writes blindly; `Some(n)` guards the write for up to `n` cycles.
        let guarded = match self.config.write_policy {
            WritePolicy::LastWriterWins => None,
            WritePolicy::Auto { max_attempts } => self
                .client
                .supports_conditional_writes()
                .then_some(max_attempts.max(1)),
            WritePolicy::CompareAndSwap { max_attempts } => {
                if !self.client.supports_conditional_writes() {
                    return Err(RepositoryError::Unsupported(
                        "compare-and-swap write policy needs a client with conditional writes",
                    ));
                }
                Some(max_attempts.max(1))
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let current = self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
            let next = next_version(id, current.version)?;

            let Some(content) = build(&current, next)? else {
                let version = current.version;
                return Ok((current, version));
            };

            match guarded {
                None => {
                    self.client
                        .put_state(id, &self.config.state_type, &self.config.state_key, content)
                        .await?;
                    return Ok((current, next));
                }
                Some(max_attempts) => {
                    let outcome = self
                        .client
                        .put_state_if_version(
                            id,
                            &self.config.state_type,
                            &self.config.state_key,
                            current.version,
                            content,
                        )
                        .await?;

                    match outcome {
                        ConditionalPut::Applied => return Ok((current, next)),
                        ConditionalPut::VersionMismatch { actual } => {
                            warn!(
                                container = %id,
                                expected = current.version,
                                actual = ?actual,
                                attempt,
                                "version moved under write"
                            );
                            if attempt >= max_attempts {
                                return Err(RepositoryError::Conflict {
                                    id: id.to_string(),
                                    expected: current.version,
                                    actual,
                                    attempts: attempt,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    fn observation_to_entry(&self, container: &str, event: StateEvent) -> Option<RecordEntry<T>> {
        if event.event_type != self.config.state_type || event.state_key != self.config.state_key {
            return None;
        }
        if !validate::number(event.content.get("version"), "version").is_valid() {
            return None;
        }

        let decoded = codec::decode(&event.content).and_then(|payload| {
            let data = codec::decode_data::<T>(payload.data)?;
            Ok(RecordEntry::new(container, data, payload.version, payload.deleted))
        });

        match decoded {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(container = %container, error = %err, "dropping malformed record observation");
                None
            }
        }
    }

    fn check_id(&self, id: &str) -> Result<(), RepositoryError> {
        if !self.config.strict_ids {
            return Ok(());
        }
        validate::container_id(id)
            .into_result()
            .map(|_| ())
            .map_err(|reasons| RepositoryError::validation(Some(id), reasons))
    }
}

fn next_version(id: &str, current: u64) -> Result<u64, RepositoryError> {
    current.checked_add(1).ok_or_else(|| {
        RepositoryError::validation(
            Some(id),
            vec![format!("version {} cannot be incremented", current)],
        )
    })
}
