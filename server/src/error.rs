//! Error types for the tracker

use shared::{ErrorCode, ProtocolError, RoomId};
use std::io;

/// A request the tracker refused
///
/// These never escape the handler that raised them: the dispatcher turns
/// each one into an error reply and leaves the registry untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("room limit reached")]
    RoomLimitReached,

    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("peer already in room {0}")]
    AlreadyInRoom(RoomId),

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("peer is not in any room")]
    PeerNotFound,
}

impl RequestError {
    /// Capacity limits, as opposed to membership state conflicts
    pub fn is_capacity(&self) -> bool {
        matches!(self, RequestError::RoomLimitReached | RequestError::RoomFull(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RequestError::RoomLimitReached => ErrorCode::RoomLimitReached,
            RequestError::RoomFull(_) => ErrorCode::RoomFull,
            RequestError::AlreadyInRoom(_) => ErrorCode::AlreadyInRoom,
            RequestError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            RequestError::PeerNotFound => ErrorCode::PeerNotFound,
        }
    }
}

/// Conditions that stop the tracker
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The room count check passed but every id in the namespace is taken.
    /// The registry is inconsistent and must not be used further.
    #[error("room namespace 1..={0} exhausted below the room limit")]
    NamespaceExhausted(RoomId),

    #[error("network channel closed")]
    ChannelClosed,
}

/// A reply or broadcast that could not be sent
///
/// Logged where it happens and then dropped; the state change that
/// produced the packet stays committed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("encode failed: {0}")]
    Encode(#[from] ProtocolError),

    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a failed request handler
#[derive(Debug)]
pub enum HandlerError {
    /// Reported back to the requester as an error reply
    Rejected(RequestError),
    /// Stops the tracker
    Fatal(TrackerError),
}

impl From<RequestError> for HandlerError {
    fn from(err: RequestError) -> Self {
        HandlerError::Rejected(err)
    }
}

impl From<TrackerError> for HandlerError {
    fn from(err: TrackerError) -> Self {
        HandlerError::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_codes() {
        assert_eq!(RequestError::RoomLimitReached.code(), ErrorCode::RoomLimitReached);
        assert_eq!(RequestError::RoomFull(1).code(), ErrorCode::RoomFull);
        assert_eq!(RequestError::AlreadyInRoom(1).code(), ErrorCode::AlreadyInRoom);
        assert_eq!(RequestError::RoomNotFound(9).code(), ErrorCode::RoomNotFound);
        assert_eq!(RequestError::PeerNotFound.code(), ErrorCode::PeerNotFound);
    }

    #[test]
    fn test_capacity_classification() {
        assert!(RequestError::RoomLimitReached.is_capacity());
        assert!(RequestError::RoomFull(2).is_capacity());
        assert!(!RequestError::RoomNotFound(2).is_capacity());
        assert!(!RequestError::PeerNotFound.is_capacity());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(RequestError::RoomFull(3).to_string(), "room 3 is full");
        assert_eq!(
            TrackerError::NamespaceExhausted(10).to_string(),
            "room namespace 1..=10 exhausted below the room limit"
        );
    }
}
