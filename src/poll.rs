use std::{
    collections::{hash_map::Entry, HashMap},
    io,
    os::fd::RawFd,
    time::Duration,
};

use mio::{event::Event, unix::SourceFd, Events, Poll, Token};

use crate::reactor::{HandlerTable, Interest, Reactor, Ready, Registration};

pub const DEFAULT_EVENTS_CAPACITY: usize = 1024;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Single-threaded, mio-backed [`Reactor`].
///
/// The loop keeps a registry of `token → (fd, interest)` for every live
/// registration. Events are translated back to the interest that was
/// registered, so a connecting socket that fails (which the OS reports as an
/// error or hang-up rather than plain writability) still reaches its write
/// handler.
///
/// mio registrations are edge-triggered. After a handler runs, a registration
/// that is still live is re-armed, so readiness that the handler did not drain
/// is reported again on the next poll (level-triggered behaviour). A client
/// doing one bounded read per event relies on this.
pub struct EventLoop {
    poller: Poll,
    events: Events,
    registry: HashMap<Token, Watch>,
    poll_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Watch {
    fd: RawFd,
    interest: Interest,
}

impl Default for EventLoop {
    /// # Panics
    ///
    /// Panics if the OS poller cannot be created.
    fn default() -> Self {
        Self::new(DEFAULT_EVENTS_CAPACITY, DEFAULT_POLL_TIMEOUT_MS)
            .expect("failed to create the OS poller")
    }
}

impl EventLoop {
    pub fn new(events_capacity: usize, poll_timeout_ms: u64) -> io::Result<Self> {
        Ok(Self {
            poller: Poll::new()?,
            events: Events::with_capacity(events_capacity),
            registry: HashMap::new(),
            poll_timeout: Duration::from_millis(poll_timeout_ms),
        })
    }

    /// Number of live registrations.
    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    /// Polls once and dispatches every ready event to its handler.
    ///
    /// `timeout` of `None` uses the loop's configured poll timeout. Handlers may
    /// register and unregister freely while they run; events are collected
    /// before the first handler is called. Returns the number of events that
    /// reached a handler.
    pub fn run_once(
        &mut self,
        timeout: Option<Duration>,
        handlers: &mut dyn HandlerTable,
    ) -> io::Result<usize> {
        let ready = self.poll(timeout)?;
        let mut dispatched = 0;

        for Ready { token, interest } in ready {
            // the handler may have dropped or replaced this registration while
            // an earlier event in the batch was dispatched
            let Some(watch) = self.registry.get(&token).copied() else {
                tracing::trace!(?token, %interest, "skipping stale readiness event");
                continue;
            };
            if watch.interest != interest {
                tracing::trace!(?token, %interest, "skipping stale readiness event");
                continue;
            }
            match handlers.handler(token) {
                Some(handler) => {
                    handler.handle_ready(self, interest);
                    dispatched += 1;
                }
                None => {
                    tracing::debug!(?token, %interest, "no handler for readiness event");
                }
            }
            if self.registry.get(&token) == Some(&watch) {
                self.poller.registry().reregister(
                    &mut SourceFd(&watch.fd),
                    token,
                    watch.interest.into(),
                )?;
            }
        }

        Ok(dispatched)
    }

    /// Polls once and returns the ready events without dispatching them.
    pub fn poll(&mut self, timeout: Option<Duration>) -> io::Result<Vec<Ready>> {
        let timeout = timeout.unwrap_or(self.poll_timeout);
        match self.poller.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(Vec::new()),
            Err(e) => return Err(e),
        }

        let ready = self
            .events
            .iter()
            .filter_map(|event| {
                let interest = self.registry.get(&event.token())?.interest;
                fires(event, interest).then_some(Ready {
                    token: event.token(),
                    interest,
                })
            })
            .collect();
        Ok(ready)
    }
}

fn fires(event: &Event, interest: Interest) -> bool {
    match interest {
        Interest::Read => event.is_readable() || event.is_read_closed() || event.is_error(),
        Interest::Write => event.is_writable() || event.is_write_closed() || event.is_error(),
    }
}

impl Reactor for EventLoop {
    fn register(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<Registration> {
        let slot = match self.registry.entry(token) {
            Entry::Occupied(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("token {} is already registered", token.0),
                ))
            }
            Entry::Vacant(slot) => slot,
        };
        self.poller
            .registry()
            .register(&mut SourceFd(&fd), token, interest.into())?;
        slot.insert(Watch { fd, interest });
        tracing::trace!(fd, ?token, %interest, "registered readiness interest");
        Ok(Registration::new(fd, token, interest))
    }

    fn unregister(&mut self, registration: Registration) -> io::Result<()> {
        self.registry.remove(&registration.token());
        tracing::trace!(
            fd = registration.fd(),
            token = ?registration.token(),
            interest = %registration.interest(),
            "unregistered readiness interest"
        );
        self.poller
            .registry()
            .deregister(&mut SourceFd(&registration.fd()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::EventHandler;
    use std::net::{TcpListener, UdpSocket};
    use std::os::fd::AsRawFd;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Interest>,
    }

    impl EventHandler for Recorder {
        fn handle_ready(&mut self, _reactor: &mut dyn Reactor, interest: Interest) {
            self.seen.push(interest);
        }
    }

    #[test]
    fn test_poll() {
        let mut event_loop = EventLoop::default();
        let ready = event_loop.poll(Some(Duration::from_millis(10))).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn test_register_unregister_tracks_registry() {
        let mut event_loop = EventLoop::default();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();

        let reg = event_loop
            .register(socket.as_raw_fd(), Interest::Read, Token(5))
            .unwrap();
        assert_eq!(event_loop.registered(), 1);

        event_loop.unregister(reg).unwrap();
        assert_eq!(event_loop.registered(), 0);
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let mut event_loop = EventLoop::default();
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();

        let _reg = event_loop
            .register(a.as_raw_fd(), Interest::Read, Token(1))
            .unwrap();
        let err = event_loop
            .register(b.as_raw_fd(), Interest::Read, Token(1))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(event_loop.registered(), 1);
    }

    #[test]
    fn test_writable_socket_dispatches_write() {
        let mut event_loop = EventLoop::default();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_nonblocking(true).unwrap();

        let _reg = event_loop
            .register(socket.as_raw_fd(), Interest::Write, Token(2))
            .unwrap();

        let mut table = HashMap::new();
        table.insert(Token(2), Recorder::default());

        let dispatched = event_loop
            .run_once(Some(Duration::from_millis(500)), &mut table)
            .unwrap();
        assert_eq!(dispatched, 1);
        assert_eq!(table[&Token(2)].seen, vec![Interest::Write]);
    }

    #[test]
    fn test_idle_listener_dispatches_nothing() {
        let mut event_loop = EventLoop::default();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();

        let _reg = event_loop
            .register(listener.as_raw_fd(), Interest::Read, Token(3))
            .unwrap();

        let mut table: HashMap<Token, Recorder> = HashMap::new();
        let dispatched = event_loop
            .run_once(Some(Duration::from_millis(20)), &mut table)
            .unwrap();
        assert_eq!(dispatched, 0);
    }
}
