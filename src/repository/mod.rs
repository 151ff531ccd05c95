//! Versioned state repository.
//!
//! Each record lives in its own container, as the latest content of one
//! state slot: `{ data, version, deleted? }`. Creation allocates the
//! container at version 1; update and delete read the slot, add one to the
//! version and write it back. Deletion is soft: the record is flagged, a
//! tombstone slot is written and the container is forgotten.
//!
//! ## Example
//!
//! ```ignore
//! use versioned_state::{InMemoryStateClient, RecordsExt, StateRecord};
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Device {
//!     pub name: String,
//! }
//!
//! impl StateRecord for Device {
//!     const STATE_TYPE: &'static str = "fi.nor.device";
//! }
//!
//! let client = InMemoryStateClient::new();
//! let devices = client.records::<Device>();
//! let created = devices.create(Device { name: "lamp".into() }).await?;
//! let updated = devices.update(&created.id, Device { name: "desk lamp".into() }).await?;
//! assert_eq!(updated.version, 2);
//! ```

mod delete;
mod error;
mod ext;
mod record;
mod state_repository;

use serde::{de::DeserializeOwned, Serialize};

pub use delete::DeleteStep;
pub use error::RepositoryError;
pub use ext::RecordsExt;
pub use record::{RecordEntry, StateRecord};
pub use state_repository::{StateRepository, INITIAL_VERSION};

/// Bounds a domain type needs to be stored by a [`StateRepository`].
pub trait RecordData: Serialize + DeserializeOwned + Clone + Send + Sync {}

impl<T: Serialize + DeserializeOwned + Clone + Send + Sync> RecordData for T {}
