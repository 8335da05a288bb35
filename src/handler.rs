//! Per-connection worker
//!
//! Drives one accepted connection through its lifecycle against the
//! registry: read the join name, register (or reject), announce, relay
//! inbound messages to everyone, and deregister on disconnect.
//!
//! There is no timeout anywhere in this path: a stalled peer parks its
//! own worker thread and nothing else.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::ClientEntry;
use crate::error::RelayError;
use crate::message;
use crate::registry::Registry;
use crate::transport::Transport;
use crate::types::{Name, MAX_NAME_LEN};

/// Inbound message buffer size, per worker.
const RECV_BUF_LEN: usize = 2048;

/// Run one connection to completion.
///
/// Returns `Err` only if the join request itself could not be read; every
/// later failure is handled here (logged, peer closed, membership cleaned
/// up) so a misbehaving peer never takes down the process.
pub fn handle_connection(registry: &Registry, transport: Arc<Transport>) -> Result<(), RelayError> {
    let peer = transport
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    // Joining: the first message is the raw display name. The buffer is
    // two bytes past the limit so an oversized name is seen as such
    // rather than silently truncated.
    let mut name_buf = [0u8; MAX_NAME_LEN + 2];
    let n = transport.recv(&mut name_buf)?;
    if n == 0 {
        debug!(%peer, "peer disconnected before sending a name");
        return Ok(());
    }

    let name = match Name::parse(&name_buf[..n]) {
        Ok(name) => name,
        Err(err) => {
            warn!(%peer, "rejecting join: {err}");
            let _ = transport.send(message::JOIN_REJECTED);
            transport.shutdown();
            return Ok(());
        }
    };

    let entry = Arc::new(ClientEntry::new(name, transport));

    if let Err(err) = registry.insert(Arc::clone(&entry)) {
        info!(%peer, name = %entry.name(), "rejecting join: {err}");
        let _ = entry.send(message::JOIN_REJECTED);
        entry.transport().shutdown();
        return Ok(());
    }

    info!(connection = %entry.id, name = %entry.name(), %peer, "client joined");

    // Active: announce, then relay until the peer goes away. If even the
    // acceptance token cannot be delivered, skip straight to leaving.
    let mut announced = false;
    if let Err(err) = entry.send(message::JOIN_ACCEPTED) {
        warn!(connection = %entry.id, "could not confirm join: {err}");
    } else {
        let _ = registry.broadcast(&message::joined(entry.name()));
        announced = true;
        relay_loop(registry, &entry);
    }

    // Leaving: deregister first so the announcement cannot reach the
    // departing member, then close.
    if registry.remove(&entry).is_ok() && announced {
        let _ = registry.broadcast(&message::left(entry.name()));
    }
    entry.transport().shutdown();

    info!(connection = %entry.id, name = %entry.name(), "client left");
    Ok(())
}

/// Fan every inbound message out to the whole registry, tagged with the
/// sender's name, until the peer disconnects or errors.
fn relay_loop(registry: &Registry, entry: &ClientEntry) {
    let mut buf = [0u8; RECV_BUF_LEN];
    loop {
        match entry.transport().recv(&mut buf) {
            Ok(0) => {
                debug!(connection = %entry.id, "peer disconnected");
                break;
            }
            Ok(n) => {
                // Broadcast failures are per-member and already logged;
                // a member with a broken transport evicts itself.
                let _ = registry.broadcast(&message::says(entry.name(), &buf[..n]));
            }
            Err(err) => {
                debug!(connection = %entry.id, "receive failed: {err}");
                break;
            }
        }
    }
}
