//! Request/reply transport over ZeroMQ `ipc://` endpoints.
//!
//! The daemon binds a REP socket per endpoint and clients connect REQ
//! sockets, so every request is answered by exactly one reply before the
//! next request is read. Each message is a single ZeroMQ frame carrying the
//! raw payload; ZeroMQ does the framing.

use crate::{Error, Result};
use std::fmt;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Endpoint scheme accepted in front of a socket path.
const IPC_SCHEME: &str = "ipc://";

/// Address of a local socket, written `ipc:///path` or as a bare path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    /// Creates an endpoint for a socket path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let path = match s.strip_prefix(IPC_SCHEME) {
            Some(path) => path,
            None if s.contains("://") => return Err(Error::InvalidEndpoint(s.to_string())),
            None => s,
        };
        if path.is_empty() {
            return Err(Error::InvalidEndpoint(s.to_string()));
        }
        Ok(Self::new(path))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", IPC_SCHEME, self.path.display())
    }
}

/// Converts a timeout to the milliseconds ZeroMQ socket options take.
/// `None` blocks forever (-1).
fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        Some(t) => t.as_millis().min(i32::MAX as u128) as i32,
        None => -1,
    }
}

/// Receives one message, folding any extra frames of a multipart message
/// into a debug log.
fn recv_message(socket: &zmq::Socket) -> zmq::Result<Vec<u8>> {
    let payload = socket.recv_bytes(0)?;
    while socket.get_rcvmore()? {
        let extra = socket.recv_bytes(0)?;
        debug!("Ignoring {} byte trailing frame", extra.len());
    }
    Ok(payload)
}

/// Server side of a request/reply endpoint (ZeroMQ REP).
pub struct ReplySocket {
    endpoint: Endpoint,
    socket: zmq::Socket,
}

impl ReplySocket {
    /// Binds the endpoint. A socket file left by a previous run is replaced;
    /// any other file at the path is refused.
    ///
    /// `timeout` bounds how long [`receive`](Self::receive) blocks.
    pub fn bind(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let path = endpoint.path();
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            if !meta.file_type().is_socket() {
                return Err(Error::InvalidEndpoint(format!(
                    "{} exists and is not a socket",
                    path.display()
                )));
            }
        }

        let context = zmq::Context::new();
        let socket = context.socket(zmq::REP)?;
        socket.set_linger(0)?;
        socket.set_rcvtimeo(timeout_ms(Some(timeout)))?;
        socket.bind(&endpoint.to_string())?;
        debug!("Bound {}", endpoint);

        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Returns the bound endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Waits for the next request.
    ///
    /// Returns `Ok(None)` when the timeout expires, so the caller can check
    /// for shutdown between requests.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        match recv_message(&self.socket) {
            Ok(request) => Ok(Some(request)),
            Err(zmq::Error::EAGAIN) | Err(zmq::Error::EINTR) => Ok(None),
            Err(e) => {
                warn!("Receive on {} failed: {}", self.endpoint, e);
                Err(e.into())
            }
        }
    }

    /// Sends the reply to the request last received.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.socket.send(payload, 0)?;
        Ok(())
    }
}

/// Client side of a request/reply endpoint (ZeroMQ REQ).
pub struct RequestSocket {
    endpoint: Endpoint,
    socket: zmq::Socket,
}

impl RequestSocket {
    /// Connects to an endpoint. `timeout` bounds each send and receive.
    ///
    /// Connecting succeeds even when nothing is bound yet; a missing daemon
    /// shows up as a [`Error::Timeout`] on the first request.
    pub fn connect(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REQ)?;
        socket.set_linger(0)?;
        socket.set_rcvtimeo(timeout_ms(timeout))?;
        socket.set_sndtimeo(timeout_ms(timeout))?;
        socket.connect(&endpoint.to_string())?;
        debug!("Connected to {}", endpoint);
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Returns the connected endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends a request and waits for its reply.
    ///
    /// After a timeout the REQ state machine is stuck waiting for the lost
    /// reply; reconnect before sending again.
    pub fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.socket.send(payload, 0).map_err(|e| self.error(e))?;
        recv_message(&self.socket).map_err(|e| self.error(e))
    }

    fn error(&self, e: zmq::Error) -> Error {
        match e {
            zmq::Error::EAGAIN => Error::Timeout(self.endpoint.to_string()),
            e => e.into(),
        }
    }
}
