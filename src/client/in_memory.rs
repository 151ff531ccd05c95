//! InMemoryStateClient - HashMap-style container store for testing and development.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use super::{
    ClientError, ConditionalPut, CreateContainer, JoinedContainer, StateClient, StateEvent,
    SyncFilter, SyncResponse,
};

type SlotKey = (String, String);

/// Internal stored representation of one container.
struct StoredContainer {
    /// Every content ever written to each slot, oldest first.
    slots: IndexMap<SlotKey, Vec<Value>>,
    joined: bool,
}

impl StoredContainer {
    fn current(&self, state_type: &str, state_key: &str) -> Option<&Value> {
        self.slots
            .get(&(state_type.to_string(), state_key.to_string()))
            .and_then(|history| history.last())
    }

    fn push(&mut self, state_type: &str, state_key: &str, content: Value) {
        self.slots
            .entry((state_type.to_string(), state_key.to_string()))
            .or_default()
            .push(content);
    }
}

#[derive(Default)]
struct Storage {
    containers: IndexMap<String, StoredContainer>,
    next_id: u64,
    next_batch: u64,
}

/// In-memory container store.
///
/// Container ids are `!<n>:<server_name>`. Clone-friendly via Arc; clones
/// share storage, which lets tests observe what a repository wrote.
#[derive(Clone)]
pub struct InMemoryStateClient {
    storage: Arc<RwLock<Storage>>,
    server_name: Arc<str>,
    redundant_history: bool,
}

impl Default for InMemoryStateClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateClient {
    pub fn new() -> Self {
        Self::with_server_name("localhost")
    }

    pub fn with_server_name(server_name: &str) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage::default())),
            server_name: Arc::from(server_name),
            redundant_history: false,
        }
    }

    /// Make `sync` return every historical version of each slot instead of
    /// only the current one, the way a server replaying redundant snapshots
    /// would.
    pub fn with_redundant_history(mut self) -> Self {
        self.redundant_history = true;
        self
    }

    /// Append arbitrary content to a slot, bypassing any shape checks.
    pub fn push_raw_state(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
        content: Value,
    ) -> Result<(), ClientError> {
        let mut storage = self.write()?;
        let stored = joined_mut(&mut storage, container)?;
        stored.push(state_type, state_key, content);
        Ok(())
    }

    /// Every content written to a slot, oldest first. Readable even after
    /// the container was forgotten.
    pub fn state_history(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
    ) -> Result<Vec<Value>, ClientError> {
        let storage = self.read()?;
        Ok(storage
            .containers
            .get(container)
            .and_then(|c| c.slots.get(&(state_type.to_string(), state_key.to_string())))
            .cloned()
            .unwrap_or_default())
    }

    pub fn is_joined(&self, container: &str) -> Result<bool, ClientError> {
        let storage = self.read()?;
        Ok(storage
            .containers
            .get(container)
            .map(|c| c.joined)
            .unwrap_or(false))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Storage>, ClientError> {
        self.storage
            .read()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Storage>, ClientError> {
        self.storage
            .write()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))
    }
}

fn joined_mut<'a>(
    storage: &'a mut Storage,
    container: &str,
) -> Result<&'a mut StoredContainer, ClientError> {
    storage
        .containers
        .get_mut(container)
        .filter(|c| c.joined)
        .ok_or_else(|| ClientError::UnknownContainer(container.to_string()))
}

fn content_version(content: &Value) -> Option<u64> {
    content.get("version").and_then(Value::as_u64)
}

#[async_trait]
impl StateClient for InMemoryStateClient {
    async fn create_container(&self, request: &CreateContainer) -> Result<String, ClientError> {
        let mut storage = self.write()?;
        storage.next_id += 1;
        let id = format!("!{}:{}", storage.next_id, self.server_name);

        let mut stored = StoredContainer {
            slots: IndexMap::new(),
            joined: true,
        };
        for event in &request.initial_state {
            stored.push(&event.event_type, &event.state_key, event.content.clone());
        }
        storage.containers.insert(id.clone(), stored);

        Ok(id)
    }

    async fn get_state(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
    ) -> Result<Option<Value>, ClientError> {
        let storage = self.read()?;
        Ok(storage
            .containers
            .get(container)
            .filter(|c| c.joined)
            .and_then(|c| c.current(state_type, state_key))
            .cloned())
    }

    async fn put_state(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
        content: Value,
    ) -> Result<(), ClientError> {
        let mut storage = self.write()?;
        joined_mut(&mut storage, container)?.push(state_type, state_key, content);
        Ok(())
    }

    async fn put_state_if_version(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
        expected: u64,
        content: Value,
    ) -> Result<ConditionalPut, ClientError> {
        let mut storage = self.write()?;
        let stored = joined_mut(&mut storage, container)?;

        let actual = stored.current(state_type, state_key).and_then(content_version);
        if actual != Some(expected) {
            return Ok(ConditionalPut::VersionMismatch { actual });
        }

        stored.push(state_type, state_key, content);
        Ok(ConditionalPut::Applied)
    }

    fn supports_conditional_writes(&self) -> bool {
        true
    }

    async fn sync(&self, filter: &SyncFilter) -> Result<SyncResponse, ClientError> {
        let mut storage = self.write()?;
        storage.next_batch += 1;
        let next_batch = format!("s{}", storage.next_batch);

        let state_filter = &filter.container.state;
        let mut containers = IndexMap::new();

        for (id, stored) in storage.containers.iter().filter(|(_, c)| c.joined) {
            let mut state_events = Vec::new();
            for ((state_type, state_key), history) in &stored.slots {
                if !state_filter.admits(state_type) {
                    continue;
                }
                let observed: &[Value] = if self.redundant_history {
                    history
                } else {
                    &history[history.len().saturating_sub(1)..]
                };
                state_events.extend(
                    observed
                        .iter()
                        .map(|content| StateEvent::new(state_type, state_key, content.clone())),
                );
            }
            containers.insert(id.clone(), JoinedContainer { state_events });
        }

        Ok(SyncResponse {
            next_batch,
            containers,
        })
    }

    async fn forget_container(&self, container: &str) -> Result<(), ClientError> {
        let mut storage = self.write()?;
        let stored = storage
            .containers
            .get_mut(container)
            .ok_or_else(|| ClientError::UnknownContainer(container.to_string()))?;
        stored.joined = false;
        Ok(())
    }
}
