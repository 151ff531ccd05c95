//! Remote store client - the boundary the repository drives.
//!
//! The remote store holds containers; each container holds named state
//! slots addressed by `(state_type, state_key)`. Authentication, retries
//! and transport framing belong to implementations of [`StateClient`].
//! [`InMemoryStateClient`] is the in-process implementation used for tests
//! and development.

mod error;
mod in_memory;
mod sync;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::ClientError;
pub use in_memory::InMemoryStateClient;
pub use sync::{
    ContainerFilter, EventFilter, JoinedContainer, StateEvent, StateFilter, SyncFilter,
    SyncResponse,
};

/// Visibility preset applied when a container is allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerPreset {
    #[default]
    PrivateChat,
    TrustedPrivateChat,
    PublicChat,
}

/// Request to allocate a new container, seeded with initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateContainer {
    pub preset: ContainerPreset,
    pub federate: bool,
    pub initial_state: Vec<StateEvent>,
}

/// Outcome of a conditional state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalPut {
    Applied,
    /// The slot's current version was not the expected one. `None` means
    /// the slot was empty or carried no readable version.
    VersionMismatch { actual: Option<u64> },
}

/// Operations the repository consumes from the remote store.
#[async_trait]
pub trait StateClient: Send + Sync {
    /// Allocate a container and return its id.
    async fn create_container(&self, request: &CreateContainer) -> Result<String, ClientError>;

    /// Read one state slot. `Ok(None)` when the slot does not exist.
    async fn get_state(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
    ) -> Result<Option<Value>, ClientError>;

    /// Overwrite one state slot unconditionally.
    async fn put_state(
        &self,
        container: &str,
        state_type: &str,
        state_key: &str,
        content: Value,
    ) -> Result<(), ClientError>;

    /// Overwrite one state slot only if its `content.version` equals `expected`.
    async fn put_state_if_version(
        &self,
        _container: &str,
        _state_type: &str,
        _state_key: &str,
        _expected: u64,
        _content: Value,
    ) -> Result<ConditionalPut, ClientError> {
        Err(ClientError::Unsupported("put_state_if_version"))
    }

    fn supports_conditional_writes(&self) -> bool {
        false
    }

    /// Bulk incremental synchronization over every joined container.
    async fn sync(&self, filter: &SyncFilter) -> Result<SyncResponse, ClientError>;

    /// Leave and forget a container so it drops out of future syncs.
    async fn forget_container(&self, container: &str) -> Result<(), ClientError>;
}
