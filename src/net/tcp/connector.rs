use std::io;
use std::net::SocketAddr;

use mio::net::TcpStream;

use super::traits::{Connect, Connector, Stream};

/// Connector for plain TCP sockets backed by [`mio::net::TcpStream`].
///
/// mio opens every socket in non-blocking mode; TCP_NODELAY is enabled here
/// before the stream is handed back.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self, addr: SocketAddr) -> io::Result<Connect<TcpStream>> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        // mio folds EINPROGRESS into Ok; ask the kernel whether the handshake
        // already finished
        match stream.peer_addr() {
            Ok(_) => Ok(Connect::Established(stream)),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(Connect::InProgress(stream)),
            Err(e) => match stream.take_error()? {
                Some(pending) => Err(pending),
                None => {
                    tracing::debug!(%addr, error = %e, "peer address unavailable, treating connect as in progress");
                    Ok(Connect::InProgress(stream))
                }
            },
        }
    }
}

impl Stream for TcpStream {
    fn take_error(&self) -> io::Result<Option<io::Error>> {
        TcpStream::take_error(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = match TcpConnector.connect(addr).unwrap() {
            Connect::Established(s) | Connect::InProgress(s) => s,
        };
        assert!(stream.nodelay().unwrap());
    }
}
