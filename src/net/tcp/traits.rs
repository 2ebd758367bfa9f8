use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::os::fd::AsRawFd;

use crate::net::errors::ClientError;
use crate::reactor::Reactor;

use super::StreamClient;

/// Connection state of a [`StreamClient`].
///
/// `Init` strictly means "no socket held"; a client returns to it on every
/// disconnect and may then connect again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Init,
    Connecting,
    Connected,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Init => write!(f, "init"),
            ClientState::Connecting => write!(f, "connecting"),
            ClientState::Connected => write!(f, "connected"),
        }
    }
}

/// A connected or connecting non-blocking byte stream.
///
/// Dropping the stream closes the underlying socket.
pub trait Stream: Read + Write + AsRawFd {
    /// Takes the socket's pending error (`SO_ERROR`), clearing it.
    fn take_error(&self) -> io::Result<Option<io::Error>>;

    /// Address of the peer; fails with `NotConnected` while a connect is still
    /// in flight.
    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

/// Outcome of starting a non-blocking connect.
#[derive(Debug)]
pub enum Connect<S> {
    /// The handshake completed synchronously.
    Established(S),
    /// The handshake is in flight; completion is signalled by write readiness.
    InProgress(S),
}

/// Opens client sockets.
///
/// Implementations must put the socket in non-blocking mode with Nagle's
/// algorithm disabled before returning it.
pub trait Connector {
    type Stream: Stream;

    /// Starts a non-blocking connect to `addr`.
    fn connect(&mut self, addr: SocketAddr) -> io::Result<Connect<Self::Stream>>;
}

/// Fired once when a connection is established.
pub type ConnectCallback<C> = Box<dyn FnMut(&mut StreamClient<C>, &mut dyn Reactor)>;

/// Fired for every successful read. The slice is only valid for the call.
pub type ReadCallback<C> = Box<dyn FnMut(&mut StreamClient<C>, &mut dyn Reactor, &[u8])>;

/// Fired on failures, and on EOF when no EOF callback is set.
pub type ErrorCallback<C> = Box<dyn FnMut(&mut StreamClient<C>, &mut dyn Reactor, &ClientError)>;
