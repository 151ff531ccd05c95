use thiserror::Error;

/// Error type for remote store client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The container does not exist or the caller is no longer a member.
    #[error("unknown container: {0}")]
    UnknownContainer(String),
    /// Network, authentication, rate-limit or any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The client does not implement the requested operation.
    #[error("operation not supported by this client: {0}")]
    Unsupported(&'static str),
}
