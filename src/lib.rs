//! Multi-client TCP chat relay
//!
//! Clients connect over TCP, register a unique display name, and
//! exchange line-oriented messages that the server fans out to every
//! connected client.
//!
//! # Architecture
//! The core is the concurrent client registry:
//! - [`FairRwLock`] is a hand-rolled writer-preferring readers/writer
//!   lock built from a mutex and two condition variables
//! - [`Bag`] is an unordered, growable collection guarded by that lock
//! - [`Registry`] layers name uniqueness, identity removal, and atomic
//!   broadcast on top of one bag of client entries
//!
//! Around the core: [`Transport`]/[`Listener`] wrap blocking TCP,
//! [`handle_connection`] drives one connection's join/relay/leave
//! lifecycle on its own thread, and [`RelayServer`] accepts connections
//! and supervises the worker threads so shutdown can join them all.
//!
//! # Example
//! ```no_run
//! use chat_relay::RelayServer;
//!
//! fn main() -> Result<(), chat_relay::RelayError> {
//!     let server = RelayServer::bind(7000)?;
//!     let acceptor = server.start();
//!     // ... until the operator asks to stop ...
//!     server.shutdown();
//!     let _ = acceptor.join();
//!     Ok(())
//! }
//! ```

pub mod bag;
pub mod client;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod rwlock;
pub mod server;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use bag::Bag;
pub use client::ClientEntry;
pub use error::RelayError;
pub use handler::handle_connection;
pub use registry::Registry;
pub use rwlock::FairRwLock;
pub use server::RelayServer;
pub use transport::{Listener, Transport};
pub use types::{ConnectionId, Name, MAX_NAME_LEN};
