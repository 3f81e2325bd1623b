//! Error types for the peer-side tracker client

use shared::{ErrorCode, PacketType, ProtocolError};
use std::io;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid tracker address {0:?}")]
    InvalidAddress(String),

    #[error("network error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed packet: {0}")]
    Protocol(#[from] ProtocolError),

    /// The tracker answered with an error reply
    #[error("tracker rejected {kind} request: {code}")]
    Rejected { kind: PacketType, code: ErrorCode },

    #[error("tracker replied to {kind} with unknown error byte {byte:#04x}")]
    UnknownError { kind: PacketType, byte: u8 },

    /// Replies are never retransmitted, so a lost datagram ends here
    #[error("no reply from tracker within {0:?}")]
    Timeout(Duration),
}
