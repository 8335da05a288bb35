//! Blocking TCP transport wrappers
//!
//! Thin, non-concurrent wrappers over `std::net` used as the relay's
//! byte-stream collaborator: [`Transport`] is one connected endpoint,
//! [`Listener`] accepts new ones. All calls block; all failures surface
//! as [`RelayError::Transport`].
//!
//! `send` and `recv` take `&self` (via the `Read`/`Write` impls on
//! `&TcpStream`), so the registry can broadcast to a member while that
//! member's own worker thread is blocked in `recv`.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use crate::error::RelayError;

/// A connected, blocking TCP endpoint.
#[derive(Debug)]
pub struct Transport {
    stream: TcpStream,
}

impl Transport {
    /// Connect to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self, RelayError> {
        let stream = TcpStream::connect((host, port))?;
        Ok(Self { stream })
    }

    /// Write the whole payload, blocking until it is handed to the OS.
    pub fn send(&self, bytes: &[u8]) -> Result<(), RelayError> {
        (&self.stream).write_all(bytes)?;
        Ok(())
    }

    /// Read at most `buf.len()` bytes, blocking until the peer sends
    /// something. Returns 0 on orderly peer shutdown.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, RelayError> {
        let n = (&self.stream).read(buf)?;
        Ok(n)
    }

    /// Bound how long [`Transport::recv`] may block. `None` (the
    /// default) blocks forever; the relay itself never sets this, but a
    /// driving client or test can.
    pub fn set_recv_timeout(&self, timeout: Option<std::time::Duration>) -> Result<(), RelayError> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Shut down both directions, unblocking any thread sitting in
    /// [`Transport::recv`] on this endpoint.
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// The peer's address, for logging.
    pub fn peer_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.stream.peer_addr()?)
    }

    pub(crate) fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }
}

/// A bound, listening TCP socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the given port on all IPv4 interfaces and start
    /// listening. Port 0 binds an ephemeral port.
    pub fn bind(port: u16) -> Result<Self, RelayError> {
        let inner = TcpListener::bind(("0.0.0.0", port))?;
        Ok(Self { inner })
    }

    /// Block until a peer connects, returning its transport.
    pub fn accept(&self) -> Result<Transport, RelayError> {
        let (stream, _) = self.inner.accept()?;
        Ok(Transport::from_stream(stream))
    }

    /// The locally bound address (useful when bound to port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.inner.local_addr()?)
    }
}
