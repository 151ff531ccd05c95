use super::{RecordData, StateRecord, StateRepository};
use crate::client::StateClient;
use crate::config::RepositoryConfig;

/// Extension trait for typed repository access on any clonable client.
pub trait RecordsExt: StateClient + Clone + Sized {
    /// Repository for a [`StateRecord`] type with default settings.
    fn records<T: StateRecord>(&self) -> StateRepository<Self, T> {
        StateRepository::new(self.clone(), RepositoryConfig::for_record::<T>())
    }

    /// Repository with an explicit config.
    fn records_with<T: RecordData>(&self, config: RepositoryConfig) -> StateRepository<Self, T> {
        StateRepository::new(self.clone(), config)
    }
}

impl<C: StateClient + Clone> RecordsExt for C {}
