//! Construction-time repository configuration.
//!
//! A config names which state slot holds records (`state_type` /
//! `state_key`), which slot marks them deleted, and how writes guard
//! against concurrent writers. It is immutable once a repository is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ContainerPreset;
use crate::repository::StateRecord;

/// Default tombstone marker type.
pub const DEFAULT_DELETED_TYPE: &str = "fi.nor.deleted";

/// How update and delete guard their read-increment-write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WritePolicy {
    /// Compare-and-swap when the client offers conditional writes, blind
    /// overwrite otherwise.
    Auto { max_attempts: u32 },
    /// Blind overwrite. Two concurrent writers can both produce version
    /// `v + 1` and the last one wins silently.
    LastWriterWins,
    /// Write only if the slot still holds the version just read; re-read
    /// and retry on mismatch, up to `max_attempts` cycles in total. Fails
    /// with `Unsupported` on a client without conditional writes.
    CompareAndSwap { max_attempts: u32 },
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::Auto { max_attempts: 3 }
    }
}

/// Container-level flags passed through verbatim on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    pub preset: ContainerPreset,
    pub federate: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            preset: ContainerPreset::PrivateChat,
            federate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub state_type: String,
    #[serde(default)]
    pub state_key: String,
    #[serde(default = "default_deleted_type")]
    pub deleted_type: String,
    #[serde(default)]
    pub deleted_key: String,
    #[serde(default)]
    pub write_policy: WritePolicy,
    #[serde(default)]
    pub container: ContainerOptions,
    /// Reject ids that are not well-formed container ids before any remote call.
    #[serde(default)]
    pub strict_ids: bool,
}

fn default_deleted_type() -> String {
    DEFAULT_DELETED_TYPE.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid repository config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid repository config: {0}")]
    Invalid(String),
}

impl RepositoryConfig {
    pub fn new(state_type: impl Into<String>) -> Self {
        Self {
            state_type: state_type.into(),
            state_key: String::new(),
            deleted_type: default_deleted_type(),
            deleted_key: String::new(),
            write_policy: WritePolicy::default(),
            container: ContainerOptions::default(),
            strict_ids: false,
        }
    }

    /// Config for a [`StateRecord`] type, keyed by its `STATE_TYPE`.
    pub fn for_record<T: StateRecord>() -> Self {
        Self::new(T::STATE_TYPE)
    }

    /// Parse a TOML document, e.g.
    ///
    /// ```toml
    /// state_type = "fi.nor.device"
    /// write_policy = { mode = "compare_and_swap", max_attempts = 5 }
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_type.is_empty() {
            return Err(ConfigError::Invalid("state_type must not be empty".into()));
        }
        if self.deleted_type.is_empty() {
            return Err(ConfigError::Invalid("deleted_type must not be empty".into()));
        }
        if self.state_type == self.deleted_type {
            return Err(ConfigError::Invalid(format!(
                "state_type and deleted_type must differ (both \"{}\")",
                self.state_type
            )));
        }
        if let WritePolicy::Auto { max_attempts: 0 }
        | WritePolicy::CompareAndSwap { max_attempts: 0 } = self.write_policy
        {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = state_key.into();
        self
    }

    pub fn with_tombstone(mut self, deleted_type: impl Into<String>, deleted_key: impl Into<String>) -> Self {
        self.deleted_type = deleted_type.into();
        self.deleted_key = deleted_key.into();
        self
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn with_container_options(mut self, container: ContainerOptions) -> Self {
        self.container = container;
        self
    }

    pub fn with_strict_ids(mut self, strict_ids: bool) -> Self {
        self.strict_ids = strict_ids;
        self
    }
}
