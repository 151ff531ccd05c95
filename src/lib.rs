pub mod client;
pub mod codec;
mod config;
pub mod reducer;
mod repository;
pub mod validate;

pub use client::{
    ClientError, ConditionalPut, ContainerPreset, CreateContainer, InMemoryStateClient,
    StateClient, StateEvent, SyncFilter, SyncResponse,
};
pub use codec::{DecodeError, WirePayload};
pub use config::{
    ConfigError, ContainerOptions, RepositoryConfig, WritePolicy, DEFAULT_DELETED_TYPE,
};
pub use reducer::{latest, latest_by_id};
pub use repository::{
    DeleteStep, RecordData, RecordEntry, RecordsExt, RepositoryError, StateRecord,
    StateRepository, INITIAL_VERSION,
};
pub use validate::Validation;
