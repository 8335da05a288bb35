//! Client entry definition
//!
//! Represents one successfully named connection as stored in the
//! registry: the validated display name plus the owned transport.

use std::sync::Arc;

use crate::error::RelayError;
use crate::transport::Transport;
use crate::types::{ConnectionId, Name};

/// One registered client
///
/// Created after the join-time name check succeeds; owned by the
/// registry (via a shared handle) from registration until removal. The
/// entry owns the connected transport for its whole lifetime.
#[derive(Debug)]
pub struct ClientEntry {
    /// Log-correlation id for this connection
    pub id: ConnectionId,
    /// Unique display name within one registry
    name: Name,
    /// The connected peer, shared with the server's supervision list
    transport: Arc<Transport>,
}

impl ClientEntry {
    /// Create an entry for a validated name on a connected transport.
    pub fn new(name: Name, transport: Arc<Transport>) -> Self {
        Self {
            id: ConnectionId::new(),
            name,
            transport,
        }
    }

    /// The display name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Send a payload to this client.
    pub fn send(&self, payload: &[u8]) -> Result<(), RelayError> {
        self.transport.send(payload)
    }
}
