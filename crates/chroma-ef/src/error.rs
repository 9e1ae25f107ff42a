//! Errors raised by embedding functions and the registry.

use thiserror::Error;

/// Failures an embedding function or the registry can raise.
#[derive(Debug, Error)]
pub enum EfError {
    /// No dense embedding function is registered under this name.
    #[error("no dense embedding function registered under \"{name}\"")]
    UnknownDense {
        /// The requested name.
        name: String,
    },
    /// No sparse embedding function is registered under this name.
    #[error("no sparse embedding function registered under \"{name}\"")]
    UnknownSparse {
        /// The requested name.
        name: String,
    },
    /// The configuration supplied to a factory was invalid.
    #[error("invalid embedding function config: {0}")]
    InvalidConfig(String),
    /// The embedding function's own computation failed (e.g. a remote
    /// inference call errored).
    #[error("embedding function \"{name}\" failed: {message}")]
    ComputationFailed {
        /// The embedding function's registered name.
        name: String,
        /// A human-readable description of the failure.
        message: String,
    },
}
