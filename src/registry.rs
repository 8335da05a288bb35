//! Client registry
//!
//! The live directory of connected, successfully named clients: one
//! [`Bag`] of shared [`ClientEntry`] handles plus the listening
//! transport. The registry layers three things on top of the bag:
//! display-name uniqueness, removal by entry identity, and best-effort
//! broadcast to every member.
//!
//! Uniqueness is enforced under a single exclusive acquisition: the name
//! scan and the insert happen on one write guard, so two racing
//! registrations of the same name can never both pass the scan.

use std::sync::Arc;

use tracing::warn;

use crate::bag::Bag;
use crate::client::ClientEntry;
use crate::error::RelayError;
use crate::transport::Listener;

/// Directory of currently connected clients.
#[derive(Debug)]
pub struct Registry {
    members: Bag<Arc<ClientEntry>>,
    listener: Listener,
}

impl Registry {
    /// Create an empty registry around a listening transport.
    pub fn new(listener: Listener) -> Self {
        Self {
            members: Bag::new(),
            listener,
        }
    }

    /// The listening transport this registry accepts members from.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Number of registered members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Register a client, enforcing name uniqueness.
    ///
    /// The scan for an existing member with the same name and the insert
    /// run under one write acquisition of the bag; a concurrent insert of
    /// the same name gets [`RelayError::Duplicate`] instead of a second
    /// membership.
    pub fn insert(&self, entry: Arc<ClientEntry>) -> Result<(), RelayError> {
        let mut members = self.members.write();
        if members
            .find_first(0, |member| member.name() == entry.name())
            .is_ok()
        {
            return Err(RelayError::Duplicate(entry.name().to_string()));
        }
        members.insert(entry)
    }

    /// Remove a member by identity (not by name), returning the removed
    /// entry or [`RelayError::NotFound`].
    pub fn remove(&self, entry: &Arc<ClientEntry>) -> Result<Arc<ClientEntry>, RelayError> {
        let mut members = self.members.write();
        let index = members.find_first(0, |member| Arc::ptr_eq(member, entry))?;
        members.remove(index)
    }

    /// Send `payload` to every member, best-effort per member.
    ///
    /// The whole membership is walked under one read acquisition, so the
    /// fan-out sees a consistent snapshot. A failed send is logged and
    /// delivery continues to the remaining members; the first error is
    /// returned once every member has been attempted. A failing member is
    /// never evicted here — its own connection worker notices the broken
    /// transport and removes it.
    pub fn broadcast(&self, payload: &[u8]) -> Result<(), RelayError> {
        if payload.is_empty() {
            return Ok(());
        }

        let members = self.members.read();
        let mut first_err = None;
        for member in members.iter() {
            if let Err(err) = member.send(payload) {
                warn!(
                    connection = %member.id,
                    name = %member.name(),
                    "broadcast send failed: {err}"
                );
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Clone the current membership under one read acquisition.
    pub fn snapshot(&self) -> Vec<Arc<ClientEntry>> {
        self.members.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use crate::types::Name;
    use std::thread;

    struct Fixture {
        registry: Arc<Registry>,
        port: u16,
    }

    fn fixture() -> Fixture {
        let listener = Listener::bind(0).unwrap();
        let port = listener.local_addr().unwrap().port();
        Fixture {
            registry: Arc::new(Registry::new(listener)),
            port,
        }
    }

    /// Connect a peer and accept it, returning the server-side entry and
    /// the client-side transport.
    fn connected_entry(fx: &Fixture, name: &str) -> (Arc<ClientEntry>, Transport) {
        let client_side = Transport::connect("127.0.0.1", fx.port).unwrap();
        let served = Arc::new(fx.registry.listener().accept().unwrap());
        let entry = Arc::new(ClientEntry::new(Name::parse(name.as_bytes()).unwrap(), served));
        (entry, client_side)
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let fx = fixture();
        let (first, _keep1) = connected_entry(&fx, "carol");
        let (second, _keep2) = connected_entry(&fx, "carol");

        fx.registry.insert(first).unwrap();
        assert!(matches!(
            fx.registry.insert(second),
            Err(RelayError::Duplicate(_))
        ));
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_remove_is_by_identity_not_name() {
        let fx = fixture();
        let (entry, _keep) = connected_entry(&fx, "alice");
        let (stranger, _keep2) = connected_entry(&fx, "bob");

        fx.registry.insert(Arc::clone(&entry)).unwrap();

        // Same name, different entry: not a member.
        assert!(matches!(
            fx.registry.remove(&stranger),
            Err(RelayError::NotFound)
        ));

        let removed = fx.registry.remove(&entry).unwrap();
        assert!(Arc::ptr_eq(&removed, &entry));
        assert!(fx.registry.is_empty());

        assert!(matches!(
            fx.registry.remove(&entry),
            Err(RelayError::NotFound)
        ));
    }

    #[test]
    fn test_racing_registrations_admit_exactly_one() {
        const RACERS: usize = 8;

        let fx = fixture();
        let mut staged = Vec::new();
        for _ in 0..RACERS {
            staged.push(connected_entry(&fx, "highlander"));
        }

        let mut handles = Vec::new();
        let mut keepalive = Vec::new();
        for (entry, client_side) in staged {
            keepalive.push(client_side);
            let registry = Arc::clone(&fx.registry);
            handles.push(thread::spawn(move || registry.insert(entry)));
        }

        let mut admitted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(()) => admitted += 1,
                Err(RelayError::Duplicate(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(duplicates, RACERS - 1);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_broadcast_reaches_every_member() {
        let fx = fixture();
        let (alice, alice_side) = connected_entry(&fx, "alice");
        let (bob, bob_side) = connected_entry(&fx, "bob");
        fx.registry.insert(alice).unwrap();
        fx.registry.insert(bob).unwrap();

        fx.registry.broadcast(b"hello\n").unwrap();

        for side in [&alice_side, &bob_side] {
            let mut buf = [0u8; 32];
            let n = side.recv(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"hello\n");
        }
    }

    #[test]
    fn test_broadcast_of_empty_payload_is_noop() {
        let fx = fixture();
        fx.registry.broadcast(b"").unwrap();
    }

    #[test]
    fn test_broadcast_continues_past_failed_member() {
        let fx = fixture();
        let (broken, _broken_side) = connected_entry(&fx, "broken");
        let (bob, bob_side) = connected_entry(&fx, "bob");

        // Kill the first member's transport before the fan-out.
        broken.transport().shutdown();
        fx.registry.insert(broken).unwrap();
        fx.registry.insert(bob).unwrap();

        let result = fx.registry.broadcast(b"still here\n");
        assert!(matches!(result, Err(RelayError::Transport(_))));

        let mut buf = [0u8; 32];
        let n = bob_side.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"still here\n");

        // Report-only: the broken member was not evicted.
        assert_eq!(fx.registry.len(), 2);
    }
}
