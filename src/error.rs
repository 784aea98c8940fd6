//! Error types

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can happen while storing or handling sessions. None of these reach the
/// client: the fairing logs them and the request carries on with the session it has.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Error serializing or deserializing the session data
    #[error("Failed to serialize/deserialize session: {0}")]
    Serialization(Box<dyn std::error::Error + Send + Sync>),
    /// I/O error from a storage backend (e.g. the filesystem store)
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure while setting up or tearing down storage resources
    #[error("Session storage setup/teardown failed: {0}")]
    SetupTeardown(String),
    /// A generic error from the storage backend. This error type can be
    /// used when implementing a custom session storage.
    #[error("Storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}
