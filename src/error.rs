//! Error types for the chat relay
//!
//! One explicit error enum threaded through every fallible call.
//! Uses thiserror for ergonomic error definitions.

use std::collections::TryReserveError;

use thiserror::Error;

/// Relay-wide error type
///
/// Covers collection misuse, allocation failure, lookup misses,
/// duplicate registrations, and transport-level I/O failures.
/// There is deliberately no shared "last error" state anywhere in the
/// crate; every operation reports its own outcome.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed input: out-of-range index, empty or oversized name
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Backing-storage growth failed
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Lookup by index, identity, or name found nothing
    #[error("not found")]
    NotFound,

    /// A client with this display name is already registered
    #[error("duplicate name: {0}")]
    Duplicate(String),

    /// Underlying socket operation failed
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl RelayError {
    /// Shorthand for index-range violations on the bag.
    pub(crate) fn bad_index(index: usize, len: usize) -> Self {
        Self::InvalidArgument(format!("index {index} out of range for length {len}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::Duplicate("alice".to_string());
        assert_eq!(err.to_string(), "duplicate name: alice");

        let err = RelayError::bad_index(3, 3);
        assert_eq!(
            err.to_string(),
            "invalid argument: index 3 out of range for length 3"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: RelayError = io.into();
        assert!(matches!(err, RelayError::Transport(_)));
    }
}
