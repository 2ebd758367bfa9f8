//! # mill-stream
//! A non-blocking, reactor-driven TCP client built on [`mio`].
//!
//! A [`StreamClient`] connects without blocking the calling thread, registers
//! readiness interest with a [`Reactor`], and reports connection completion,
//! incoming data, end-of-stream and errors through callbacks. [`EventLoop`] is
//! the bundled single-threaded reactor; anything implementing [`Reactor`] (a
//! test double, another loop) can stand in for it.
//!
//! ## Features
//! - **Non-blocking connect**: immediate and delayed completion, with the
//!   outcome taken from the socket's pending error
//! - **Single-threaded**: no locks, no worker threads; callbacks run on the
//!   thread driving the loop
//! - **Explicit reactor**: every operation that touches readiness takes the
//!   reactor as a parameter
//! - **Typed callbacks**: one slot per event, each with its own signature
//!
//! ## Architecture Overview
//! ```text
//! ┌──────────────┐ register  ┌──────────────┐    ┌─────────────┐
//! │ StreamClient │─────────▶│  EventLoop   │───▶│  mio::Poll  │
//! └──────────────┘           └──────────────┘    └─────────────┘
//!        ▲                           │
//!        │  handle_ready(interest)   │ token lookup
//!        └─────────────────── HandlerTable
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mill_stream::{ClientState, EventLoop, StreamClient};
//! use mio::Token;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut event_loop = EventLoop::default();
//!     let mut client = StreamClient::new(Token(1));
//!
//!     client.on_read(|_client, _reactor, data| {
//!         println!("read {} bytes", data.len());
//!     });
//!     client.on_eof(|_client, _reactor, _err| println!("peer closed"));
//!
//!     client.connect(&mut event_loop, "127.0.0.1:9000".parse()?)?;
//!     while client.state() != ClientState::Init {
//!         event_loop.run_once(None, &mut client)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! - [`StreamClient`]: the connection state machine
//! - [`EventLoop`]: mio-backed reactor with one-shot dispatch
//! - [`reactor`]: the readiness seam ([`Reactor`], [`EventHandler`], [`HandlerTable`])
//! - [`net::errors`]: error type and result alias

#[cfg(not(unix))]
compile_error!("mill-stream registers raw file descriptors and only supports unix targets");

pub mod net;
pub mod poll;
pub mod reactor;

pub use net::errors::{ClientError, Result};
pub use net::tcp::{
    config::StreamClientConfig, connector::TcpConnector, traits::ClientState, StreamClient,
    KEEPALIVE_PAYLOAD,
};
pub use poll::EventLoop;
pub use reactor::{EventHandler, HandlerTable, Interest, Ready, Reactor, Registration};

/// Re-exports of the commonly used types and traits.
///
/// ```rust
/// use mill_stream::prelude::*;
/// ```
pub mod prelude {
    pub use crate::net::errors::ClientError;
    pub use crate::net::tcp::config::StreamClientConfig;
    pub use crate::net::tcp::traits::{ClientState, Connect, Connector, Stream};
    pub use crate::net::tcp::StreamClient;
    pub use crate::poll::EventLoop;
    pub use crate::reactor::{EventHandler, HandlerTable, Interest, Reactor, Registration};
}
