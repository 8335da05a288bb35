//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: UUID-based unique connection identifier
//! - `Name`: bounds-checked display name

use uuid::Uuid;

use crate::error::RelayError;

/// Maximum display-name length in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. Used to correlate log lines for one connection;
/// registry membership itself is tracked by entry identity, not by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated display name
///
/// A name is UTF-8 text, non-empty, at most [`MAX_NAME_LEN`] bytes, and
/// contains no newline (the relay's announcements are line-oriented).
/// Trailing whitespace and NUL padding from the wire are stripped before
/// validation, so `b"alice\r\n"` and `b"alice\0\0"` both parse as `alice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    /// Parse a display name from raw join-request bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, RelayError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| RelayError::InvalidArgument("name is not valid UTF-8".to_string()))?;
        let text = text.trim_end_matches(['\0', '\r', '\n', ' ', '\t']);

        if text.is_empty() {
            return Err(RelayError::InvalidArgument("name is empty".to_string()));
        }
        if text.len() > MAX_NAME_LEN {
            return Err(RelayError::InvalidArgument(format!(
                "name exceeds {MAX_NAME_LEN} bytes"
            )));
        }
        if text.contains('\n') {
            return Err(RelayError::InvalidArgument(
                "name contains a newline".to_string(),
            ));
        }

        Ok(Self(text.to_string()))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
