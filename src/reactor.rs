//! Readiness-notification seam between the client and the event loop.
//!
//! A [`Reactor`] accepts interest in a file descriptor becoming readable or
//! writable and hands back a [`Registration`]. The token supplied at
//! registration time is the only context the reactor keeps: when the OS reports
//! readiness, the driver looks the token up in a [`HandlerTable`] and calls the
//! owning [`EventHandler`] with the interest that fired.
//!
//! ```text
//!   StreamClient ──register(fd, Write, token)──▶ Reactor
//!        ▲                                          │ OS readiness
//!        │ handle_ready(reactor, Write)             ▼
//!   HandlerTable ◀───────────── Ready { token, interest: Write }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::os::fd::RawFd;

use mio::Token;

/// The readiness kind a registration waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interest {
    Read,
    Write,
}

impl From<Interest> for mio::Interest {
    fn from(interest: Interest) -> Self {
        match interest {
            Interest::Read => mio::Interest::READABLE,
            Interest::Write => mio::Interest::WRITABLE,
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interest::Read => write!(f, "read"),
            Interest::Write => write!(f, "write"),
        }
    }
}

/// Handle to an active readiness registration.
///
/// Deliberately not `Clone`: the holder is the only party allowed to hand it
/// back to [`Reactor::unregister`], which consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct Registration {
    fd: RawFd,
    token: Token,
    interest: Interest,
}

impl Registration {
    /// Builds a registration record. Reactor implementations call this from
    /// [`Reactor::register`].
    pub fn new(fd: RawFd, token: Token, interest: Interest) -> Self {
        Self {
            fd,
            token,
            interest,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn interest(&self) -> Interest {
        self.interest
    }
}

/// A readiness notification produced by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    pub token: Token,
    pub interest: Interest,
}

/// Registers and removes interest in socket readiness.
///
/// Implementations are single-threaded: every call happens on the thread that
/// drives the loop, either from user code or from inside a dispatched handler.
pub trait Reactor {
    /// Starts watching `fd` for `interest`. Events are reported under `token`.
    fn register(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<Registration>;

    /// Stops watching the registration. Must be called before the fd is closed.
    fn unregister(&mut self, registration: Registration) -> io::Result<()>;
}

/// Receives readiness notifications for the registrations it owns.
pub trait EventHandler {
    fn handle_ready(&mut self, reactor: &mut dyn Reactor, interest: Interest);
}

/// Maps a token back to the handler that registered it.
pub trait HandlerTable {
    fn handler(&mut self, token: Token) -> Option<&mut dyn EventHandler>;
}

impl<H: EventHandler> HandlerTable for HashMap<Token, H> {
    fn handler(&mut self, token: Token) -> Option<&mut dyn EventHandler> {
        self.get_mut(&token).map(|h| h as &mut dyn EventHandler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);

    impl EventHandler for Counter {
        fn handle_ready(&mut self, _reactor: &mut dyn Reactor, _interest: Interest) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_interest_maps_to_mio() {
        assert_eq!(mio::Interest::from(Interest::Read), mio::Interest::READABLE);
        assert_eq!(mio::Interest::from(Interest::Write), mio::Interest::WRITABLE);
    }

    #[test]
    fn test_registration_accessors() {
        let reg = Registration::new(7, Token(3), Interest::Write);
        assert_eq!(reg.fd(), 7);
        assert_eq!(reg.token(), Token(3));
        assert_eq!(reg.interest(), Interest::Write);
    }

    #[test]
    fn test_hash_map_table_lookup() {
        let mut table = HashMap::new();
        table.insert(Token(1), Counter(0));

        assert!(table.handler(Token(1)).is_some());
        assert!(table.handler(Token(2)).is_none());
    }
}
