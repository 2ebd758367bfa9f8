//! Non-blocking TCP client driven by readiness notifications.
//!
//! A [`StreamClient`] owns at most one socket and at most one readiness
//! registration at a time. It never blocks: `connect` either finishes on the
//! spot or registers write interest and returns, and all further progress
//! happens inside [`StreamClient::handle_ready`], which the event loop calls
//! when the registered interest fires.
//!
//! ## State Machine
//!
//! ```text
//!            connect: established                     read == 0 / read error
//!   ┌──────┐ ──────────────────────────────▶ ┌───────────┐ ───────────────┐
//!   │ Init │                                 │ Connected │                │
//!   └──────┘ ──▶ ┌────────────┐ write-ready  └───────────┘                │
//!      ▲  in     │ Connecting │ ──────────────────▲                       │
//!      │progress └────────────┘  no pending error                         │
//!      │               │ pending error / wrong state                      │
//!      └───────────────┴──────────────────────────────────────────────────┘
//!                          disconnect (any state)
//! ```
//!
//! | state      | socket | registration      |
//! |------------|--------|-------------------|
//! | Init       | none   | none              |
//! | Connecting | open   | write interest    |
//! | Connected  | open   | read interest     |
//!
//! Cleanup always happens before a failure is reported, so callbacks observe a
//! client that is already back in `Init` and may reconnect immediately.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mill_stream::net::tcp::StreamClient;
//! use mill_stream::EventLoop;
//! use mio::Token;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut event_loop = EventLoop::default();
//! let mut client = StreamClient::new(Token(1));
//!
//! client.on_connect(|client, _reactor| {
//!     let _ = client.send(b"hello");
//! });
//! client.on_read(|_client, _reactor, data| {
//!     println!("received {} bytes", data.len());
//! });
//! client.on_error(|_client, _reactor, err| {
//!     eprintln!("error {}: {}", err.code(), err);
//! });
//!
//! client.connect(&mut event_loop, "127.0.0.1:7000".parse()?)?;
//! while client.state() != mill_stream::ClientState::Init {
//!     event_loop.run_once(None, &mut client)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod traits;

use std::io::{self, Read, Write};
use std::mem;
use std::net::SocketAddr;
use std::os::fd::AsRawFd;

use mio::Token;

use crate::net::errors::{is_transient, ClientError, Result};
use crate::reactor::{EventHandler, HandlerTable, Interest, Reactor, Registration};
use config::StreamClientConfig;
use connector::TcpConnector;
use traits::{
    ClientState, Connect, ConnectCallback, Connector, ErrorCallback, ReadCallback, Stream,
};

/// Marker written by [`StreamClient::keepalive`]. Not null-terminated.
pub const KEEPALIVE_PAYLOAD: &[u8; 10] = b"keep-alive";

/// Callback-driven, non-blocking TCP client.
pub struct StreamClient<C: Connector = TcpConnector> {
    token: Token,
    config: StreamClientConfig,
    connector: C,
    stream: Option<C::Stream>,
    state: ClientState,
    read_registration: Option<Registration>,
    write_registration: Option<Registration>,
    buffer: Vec<u8>,
    connect_cb: Option<ConnectCallback<C>>,
    read_cb: Option<ReadCallback<C>>,
    eof_cb: Option<ErrorCallback<C>>,
    error_cb: Option<ErrorCallback<C>>,
}

impl StreamClient<TcpConnector> {
    /// Creates a disconnected client whose readiness events are reported under
    /// `token`.
    pub fn new(token: Token) -> Self {
        Self::with_config(token, StreamClientConfig::default())
    }

    pub fn with_config(token: Token, config: StreamClientConfig) -> Self {
        Self::with_connector(token, config, TcpConnector)
    }
}

impl<C: Connector> StreamClient<C> {
    /// Creates a disconnected client that opens its sockets through `connector`.
    pub fn with_connector(token: Token, config: StreamClientConfig, connector: C) -> Self {
        let buffer = vec![0; config.read_buffer_size.max(1)];
        Self {
            token,
            config,
            connector,
            stream: None,
            state: ClientState::Init,
            read_registration: None,
            write_registration: None,
            buffer,
            connect_cb: None,
            read_cb: None,
            eof_cb: None,
            error_cb: None,
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Connected
    }

    pub fn config(&self) -> &StreamClientConfig {
        &self.config
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match &self.stream {
            Some(stream) => stream.peer_addr(),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    pub fn on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Self, &mut dyn Reactor) + 'static,
    {
        self.connect_cb = Some(Box::new(callback));
    }

    pub fn on_read<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Self, &mut dyn Reactor, &[u8]) + 'static,
    {
        self.read_cb = Some(Box::new(callback));
    }

    /// Without an EOF callback, end-of-stream is reported to the error callback.
    pub fn on_eof<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Self, &mut dyn Reactor, &ClientError) + 'static,
    {
        self.eof_cb = Some(Box::new(callback));
    }

    pub fn on_error<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Self, &mut dyn Reactor, &ClientError) + 'static,
    {
        self.error_cb = Some(Box::new(callback));
    }

    /// Starts connecting to `addr` without blocking.
    ///
    /// The client must be in [`ClientState::Init`]; otherwise
    /// [`ClientError::InvalidState`] is returned and nothing changes.
    ///
    /// If the connect fails synchronously, or the reactor rejects the
    /// registration, the error callback fires before this returns and the
    /// client stays in `Init` with no socket held.
    pub fn connect(&mut self, reactor: &mut dyn Reactor, addr: SocketAddr) -> Result<()> {
        if self.state != ClientState::Init {
            return Err(ClientError::InvalidState(self.state));
        }

        let attempt = match self.connector.connect(addr) {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::warn!(token = ?self.token, %addr, code = e.raw_os_error(), error = %e, "connect failed");
                return self.fail(reactor, ClientError::Connect(e));
            }
        };

        match attempt {
            Connect::Established(stream) => {
                self.stream = Some(stream);
                if let Err(err) = self.establish(reactor) {
                    return self.fail(reactor, err);
                }
                self.fire_connect(reactor);
            }
            Connect::InProgress(stream) => {
                let fd = stream.as_raw_fd();
                self.stream = Some(stream);
                self.state = ClientState::Connecting;
                match reactor.register(fd, Interest::Write, self.token) {
                    Ok(registration) => self.write_registration = Some(registration),
                    Err(e) => return self.fail(reactor, ClientError::Register(e)),
                }
                tracing::debug!(token = ?self.token, %addr, "connect in progress");
            }
        }
        Ok(())
    }

    /// Drops both registrations and closes the socket. Idempotent.
    ///
    /// Safe to call from inside any callback of this client.
    pub fn disconnect(&mut self, reactor: &mut dyn Reactor) {
        let registrations = [self.read_registration.take(), self.write_registration.take()];
        for registration in registrations.into_iter().flatten() {
            if let Err(e) = reactor.unregister(registration) {
                tracing::warn!(token = ?self.token, error = %e, "failed to unregister readiness interest");
            }
        }
        if self.stream.take().is_some() {
            tracing::debug!(token = ?self.token, "socket closed");
        }
        self.state = ClientState::Init;
    }

    /// Disconnects if needed and releases the client.
    pub fn close(mut self, reactor: &mut dyn Reactor) {
        self.disconnect(reactor);
    }

    /// Writes [`KEEPALIVE_PAYLOAD`] to the peer.
    ///
    /// Interrupted and would-block writes are retried immediately, up to
    /// `keepalive_retries` attempts. Failures are returned, never reported via
    /// the error callback, and the reactor is not involved.
    pub fn keepalive(&mut self) -> Result<()> {
        let stream = match (&mut self.stream, self.state) {
            (Some(stream), ClientState::Connected) => stream,
            _ => {
                tracing::warn!(token = ?self.token, "connection already closed, try reconnect");
                return Err(ClientError::NotConnected);
            }
        };

        let attempts = self.config.keepalive_retries.max(1);
        let mut written = 0;
        for _ in 0..attempts {
            match stream.write(&KEEPALIVE_PAYLOAD[written..]) {
                Ok(0) => {
                    let e = io::Error::from(io::ErrorKind::WriteZero);
                    tracing::warn!(token = ?self.token, error = %e, "failed to write keep-alive packet");
                    return Err(ClientError::Write(e));
                }
                Ok(n) => {
                    written += n;
                    if written == KEEPALIVE_PAYLOAD.len() {
                        return Ok(());
                    }
                }
                Err(e) if is_transient(&e) => continue,
                Err(e) => {
                    tracing::warn!(token = ?self.token, code = e.raw_os_error(), error = %e, "failed to write keep-alive packet");
                    return Err(ClientError::Write(e));
                }
            }
        }

        tracing::warn!(token = ?self.token, attempts, "keep-alive write kept blocking");
        Err(ClientError::KeepaliveExhausted(attempts))
    }

    /// Performs a single non-blocking write and returns the bytes accepted.
    ///
    /// Nothing is buffered: a would-block condition is returned to the caller
    /// as [`ClientError::Write`].
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        match (&mut self.stream, self.state) {
            (Some(stream), ClientState::Connected) => stream.write(data).map_err(ClientError::Write),
            _ => Err(ClientError::NotConnected),
        }
    }

    /// Entry point for the event loop: `interest` is the registration that
    /// fired for this client's token.
    pub fn handle_ready(&mut self, reactor: &mut dyn Reactor, interest: Interest) {
        match interest {
            Interest::Write => self.connect_ready(reactor),
            Interest::Read => self.read_ready(reactor),
        }
    }

    fn connect_ready(&mut self, reactor: &mut dyn Reactor) {
        if self.state != ClientState::Connecting {
            tracing::error!(token = ?self.token, state = %self.state, "wrong state on connect completion");
            let err = ClientError::WrongState(self.state);
            self.report(reactor, err);
            return;
        }

        let Some(stream) = &self.stream else {
            let err = ClientError::WrongState(self.state);
            self.report(reactor, err);
            return;
        };

        match stream.take_error() {
            Err(e) => {
                tracing::warn!(token = ?self.token, code = e.raw_os_error(), error = %e, "querying pending socket error failed");
                self.report(reactor, ClientError::PendingError(e));
                return;
            }
            Ok(Some(e)) => {
                tracing::warn!(token = ?self.token, code = e.raw_os_error(), error = %e, "establishing connection failed");
                self.report(reactor, ClientError::Establish(e));
                return;
            }
            Ok(None) => {}
        }

        // writability without a resolved handshake: keep waiting
        if let Err(e) = stream.peer_addr() {
            if e.kind() == io::ErrorKind::NotConnected {
                tracing::trace!(token = ?self.token, "spurious write readiness while connecting");
                return;
            }
        }

        if let Some(registration) = self.write_registration.take() {
            if let Err(e) = reactor.unregister(registration) {
                tracing::warn!(token = ?self.token, error = %e, "failed to unregister write interest");
            }
        }
        match self.establish(reactor) {
            Ok(()) => self.fire_connect(reactor),
            Err(err) => self.report(reactor, err),
        }
    }

    fn read_ready(&mut self, reactor: &mut dyn Reactor) {
        match self.state {
            ClientState::Connected => {}
            ClientState::Init => {
                tracing::trace!(token = ?self.token, "read readiness without a connection");
                return;
            }
            ClientState::Connecting => {
                tracing::error!(token = ?self.token, state = %self.state, "wrong state on read readiness");
                let err = ClientError::WrongState(self.state);
                self.report(reactor, err);
                return;
            }
        }

        let mut buffer = mem::take(&mut self.buffer);
        let result = match self.stream.as_mut() {
            Some(stream) => stream.read(&mut buffer),
            None => Err(io::ErrorKind::NotConnected.into()),
        };

        match result {
            Ok(0) => {
                self.buffer = buffer;
                tracing::info!(token = ?self.token, "unexpected eof");
                self.disconnect(reactor);
                self.fire_eof(reactor);
            }
            Ok(n) => {
                tracing::trace!(token = ?self.token, bytes = n, "read");
                if let Some(mut callback) = self.read_cb.take() {
                    callback(self, reactor, &buffer[..n]);
                    if self.read_cb.is_none() {
                        self.read_cb = Some(callback);
                    }
                }
                self.buffer = buffer;
            }
            Err(e) if is_transient(&e) => {
                self.buffer = buffer;
            }
            Err(e) => {
                self.buffer = buffer;
                tracing::warn!(token = ?self.token, code = e.raw_os_error(), error = %e, "read error");
                self.report(reactor, ClientError::Read(e));
            }
        }
    }

    /// Registers read interest on the held socket and enters `Connected`.
    fn establish(&mut self, reactor: &mut dyn Reactor) -> Result<()> {
        let fd = match &self.stream {
            Some(stream) => stream.as_raw_fd(),
            None => return Err(ClientError::NotConnected),
        };
        let registration = reactor
            .register(fd, Interest::Read, self.token)
            .map_err(ClientError::Register)?;
        self.read_registration = Some(registration);
        self.state = ClientState::Connected;
        tracing::info!(token = ?self.token, "connect success");
        Ok(())
    }

    /// Tears down, reports `err`, and hands it back to the caller.
    fn fail(&mut self, reactor: &mut dyn Reactor, err: ClientError) -> Result<()> {
        self.disconnect(reactor);
        self.fire_error(reactor, &err);
        Err(err)
    }

    /// Tears down and reports `err` from inside a readiness handler.
    fn report(&mut self, reactor: &mut dyn Reactor, err: ClientError) {
        self.disconnect(reactor);
        self.fire_error(reactor, &err);
    }

    fn fire_connect(&mut self, reactor: &mut dyn Reactor) {
        if let Some(mut callback) = self.connect_cb.take() {
            callback(self, reactor);
            if self.connect_cb.is_none() {
                self.connect_cb = Some(callback);
            }
        }
    }

    fn fire_eof(&mut self, reactor: &mut dyn Reactor) {
        match self.eof_cb.take() {
            Some(mut callback) => {
                callback(self, reactor, &ClientError::Eof);
                if self.eof_cb.is_none() {
                    self.eof_cb = Some(callback);
                }
            }
            None => self.fire_error(reactor, &ClientError::Eof),
        }
    }

    fn fire_error(&mut self, reactor: &mut dyn Reactor, err: &ClientError) {
        if let Some(mut callback) = self.error_cb.take() {
            callback(self, reactor, err);
            if self.error_cb.is_none() {
                self.error_cb = Some(callback);
            }
        }
    }
}

impl<C: Connector> EventHandler for StreamClient<C> {
    fn handle_ready(&mut self, reactor: &mut dyn Reactor, interest: Interest) {
        StreamClient::handle_ready(self, reactor, interest);
    }
}

impl<C: Connector> HandlerTable for StreamClient<C> {
    fn handler(&mut self, token: Token) -> Option<&mut dyn EventHandler> {
        if token == self.token {
            Some(self)
        } else {
            None
        }
    }
}

impl<C: Connector> Drop for StreamClient<C> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            // without the reactor the registrations cannot be removed; the
            // socket still closes when the stream drops
            tracing::warn!(
                token = ?self.token,
                state = %self.state,
                "client dropped while holding a socket; call disconnect or close first"
            );
        }
    }
}

impl<C: Connector> std::fmt::Debug for StreamClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("token", &self.token)
            .field("state", &self.state)
            .field("read_registration", &self.read_registration)
            .field("write_registration", &self.write_registration)
            .finish()
    }
}
