use std::io;

use crate::net::tcp::traits::ClientState;

/// Failures surfaced by [`StreamClient`](crate::net::tcp::StreamClient).
///
/// Variants that carry an [`io::Error`] report its OS error code through
/// [`ClientError::code`]; the remaining variants report `0`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// `connect()` was rejected synchronously.
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// The socket reported a pending error once the connect attempt resolved.
    #[error("establishing connection failed: {0}")]
    Establish(#[source] io::Error),

    /// Querying the socket's pending error failed.
    #[error("querying pending socket error failed: {0}")]
    PendingError(#[source] io::Error),

    /// A readiness handler ran while the client was in an unexpected state.
    #[error("wrong state {0} on connect completion")]
    WrongState(ClientState),

    /// Reading from the connected socket failed.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// The peer closed the connection.
    #[error("unexpected eof")]
    Eof,

    /// The operation requires a live connection.
    #[error("connection already closed")]
    NotConnected,

    /// `connect` was called on a client that is not in `Init`.
    #[error("connect called in state {0}, expected init")]
    InvalidState(ClientState),

    /// The reactor refused a readiness registration.
    #[error("readiness registration failed: {0}")]
    Register(#[source] io::Error),

    /// Writing to the connected socket failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The keepalive write kept hitting transient errors.
    #[error("keep-alive write still blocked after {0} attempts")]
    KeepaliveExhausted(usize),
}

impl ClientError {
    /// OS error code at the time of the failure, or `0` for sentinel cases.
    pub fn code(&self) -> i32 {
        match self {
            ClientError::Connect(e)
            | ClientError::Establish(e)
            | ClientError::PendingError(e)
            | ClientError::Read(e)
            | ClientError::Register(e)
            | ClientError::Write(e) => e.raw_os_error().unwrap_or(0),
            ClientError::WrongState(_)
            | ClientError::Eof
            | ClientError::NotConnected
            | ClientError::InvalidState(_)
            | ClientError::KeepaliveExhausted(_) => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// `true` for errors that only mean "try again": interrupted or would-block.
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_os_error() {
        let err = ClientError::Establish(io::Error::from_raw_os_error(111));
        assert_eq!(err.code(), 111);
    }

    #[test]
    fn test_sentinel_codes_are_zero() {
        assert_eq!(ClientError::WrongState(ClientState::Init).code(), 0);
        assert_eq!(ClientError::Eof.code(), 0);
        assert_eq!(ClientError::NotConnected.code(), 0);
    }

    #[test]
    fn test_code_without_os_error() {
        let err = ClientError::Read(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.code(), 0);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ClientError::WrongState(ClientState::Init).to_string(),
            "wrong state init on connect completion"
        );
        assert_eq!(ClientError::Eof.to_string(), "unexpected eof");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(is_transient(&io::ErrorKind::WouldBlock.into()));
        assert!(is_transient(&io::ErrorKind::Interrupted.into()));
        assert!(!is_transient(&io::ErrorKind::ConnectionReset.into()));
    }
}
