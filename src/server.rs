//! Relay server
//!
//! Owns the registry and supervises the connection threads: one acceptor
//! thread plus one worker per accepted connection. Workers are tracked
//! (not detached), so [`RelayServer::shutdown`] can unblock every worker
//! by shutting its socket down and then join them all before the
//! registry is dropped. The registry is therefore never torn down while
//! a worker still holds it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::error::RelayError;
use crate::handler::handle_connection;
use crate::registry::Registry;
use crate::transport::{Listener, Transport};

/// One tracked connection: its worker thread and the socket to shake it
/// loose with.
struct Worker {
    handle: JoinHandle<()>,
    transport: Arc<Transport>,
}

/// The chat relay server.
pub struct RelayServer {
    registry: Arc<Registry>,
    shutting_down: AtomicBool,
    workers: Mutex<Vec<Worker>>,
}

impl RelayServer {
    /// Bind the listening socket and create an empty registry around it.
    /// Port 0 binds an ephemeral port; see [`RelayServer::local_addr`].
    pub fn bind(port: u16) -> Result<Arc<Self>, RelayError> {
        let listener = Listener::bind(port)?;
        Ok(Arc::new(Self {
            registry: Arc::new(Registry::new(listener)),
            shutting_down: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        }))
    }

    /// The bound listening address.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        self.registry.listener().local_addr()
    }

    /// The client registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Spawn the acceptor thread. The returned handle finishes once
    /// [`RelayServer::shutdown`] has run.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let server = Arc::clone(self);
        thread::spawn(move || server.accept_loop())
    }

    fn accept_loop(&self) {
        info!("acceptor started");
        loop {
            match self.registry.listener().accept() {
                Ok(transport) => {
                    if self.shutting_down.load(Ordering::SeqCst) {
                        break;
                    }
                    self.spawn_worker(Arc::new(transport));
                }
                Err(err) => {
                    if self.shutting_down.load(Ordering::SeqCst) {
                        break;
                    }
                    error!("failed to accept connection: {err}");
                }
            }
        }
        info!("acceptor stopped");
    }

    fn spawn_worker(&self, transport: Arc<Transport>) {
        let registry = Arc::clone(&self.registry);
        let worker_transport = Arc::clone(&transport);

        let handle = thread::spawn(move || {
            if let Err(err) = handle_connection(&registry, worker_transport) {
                error!("connection worker failed: {err}");
            }
        });

        let mut workers = self.lock_workers();
        // Reap workers whose connections already ended, so the list only
        // grows with live connections.
        workers.retain(|worker| !worker.handle.is_finished());
        workers.push(Worker { handle, transport });
        debug!(live_workers = workers.len(), "worker spawned");

        // A shutdown may have raced in between the acceptor's flag check
        // and the push; make sure this late worker gets unblocked too.
        if self.shutting_down.load(Ordering::SeqCst) {
            if let Some(worker) = workers.last() {
                worker.transport.shutdown();
            }
        }
    }

    /// Tear the server down: stop accepting, unblock every connection
    /// worker by shutting its socket down, and join them all. Idempotent.
    ///
    /// After this returns no thread references the registry any more.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("shutting down");

        // Wake the acceptor out of its blocking accept with a throwaway
        // connection to ourselves; it sees the flag and exits.
        if let Ok(addr) = self.local_addr() {
            let _ = Transport::connect("127.0.0.1", addr.port());
        }

        let workers = std::mem::take(&mut *self.lock_workers());
        for worker in &workers {
            worker.transport.shutdown();
        }
        for worker in workers {
            let _ = worker.handle.join();
        }

        info!("all connection workers finished");
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<Worker>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
