use std::fmt;

/// Failures surfaced by a database backend during connect or retrieve.
/// Always delivered through the continuation, never returned synchronously.
#[derive(Debug)]
pub enum BackendError {
    Connect(String),
    NotFound { path: String, timestamp: i64 },
    Retrieve(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Connect(msg) =>
                write!(f, "backend connect failed: {}", msg),
            BackendError::NotFound { path, timestamp } =>
                write!(f, "no object at {} valid for timestamp {}", path, timestamp),
            BackendError::Retrieve(msg) =>
                write!(f, "backend retrieve failed: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug)]
pub enum FetchError {
    /// Malformed call, the caller's bug. Raised synchronously.
    InvalidArgument(&'static str),
    /// `get` was called before any successful `init`.
    NotConfigured,
    /// The configured backend type has no registered implementation.
    UnknownBackend(String),
    /// Operational failure from the backend, reported through the continuation.
    Backend(BackendError),
    /// The retrieval task died (panicked or was torn down) without
    /// delivering a result. An internal fault, not a backend error.
    TaskFailed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidArgument(msg) =>
                write!(f, "invalid argument: {}", msg),
            FetchError::NotConfigured =>
                write!(f, "no backend configured (call init first)"),
            FetchError::UnknownBackend(name) =>
                write!(f, "unknown backend type '{}'", name),
            FetchError::Backend(e) =>
                write!(f, "{}", e),
            FetchError::TaskFailed(msg) =>
                write!(f, "retrieval task failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<BackendError> for FetchError {
    fn from(e: BackendError) -> Self {
        FetchError::Backend(e)
    }
}
