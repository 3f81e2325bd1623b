//! Wire protocol spoken between the rendezvous tracker and its peers
//!
//! Every datagram is a fixed 10-byte header followed by a payload whose
//! meaning depends on the packet type:
//!
//! | Field            | Width   |
//! |------------------|---------|
//! | `type`           | 1 byte  |
//! | `error`          | 1 byte  |
//! | `room`           | 4 bytes |
//! | `payload_length` | 4 bytes |
//! | payload          | rest    |
//!
//! ## Byte order
//!
//! The multi-byte header fields travel little-endian. Deployed peers write
//! the header straight from memory on x86 hosts, so this is a
//! same-architecture assumption rather than a canonical network order.
//! Mixed-endian deployments need a protocol revision; the codec does not
//! convert silently.
//!
//! Roster records inside join and update payloads use the `sockaddr_in`
//! layout, so their port and address are in network byte order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Identifier of a room. Zero is never allocated.
pub type RoomId = u32;

/// A peer is identified by the IPv4 endpoint its requests come from.
pub type PeerEndpoint = SocketAddrV4;

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 10;

/// Largest datagram either side sends or expects to receive
pub const MAX_PACKET_SIZE: usize = 2048;

/// Largest payload that fits in a single datagram
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// Size of one roster record (`sockaddr_in` layout)
pub const PEER_RECORD_SIZE: usize = 16;

/// List reply payload when no room is active
pub const NO_ROOMS_TEXT: &str = "There are no chatrooms\n";

const AF_INET: u16 = 2;

/// Discriminator carried in the first header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    Create,
    Join,
    Leave,
    List,
    /// Roster push to room members other than the joining peer (tracker to peer only)
    Update,
}

impl PacketType {
    pub fn as_byte(self) -> u8 {
        match self {
            PacketType::Create => b'c',
            PacketType::Join => b'j',
            PacketType::Leave => b'l',
            PacketType::List => b'r',
            PacketType::Update => b'u',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'c' => Some(PacketType::Create),
            b'j' => Some(PacketType::Join),
            b'l' => Some(PacketType::Leave),
            b'r' => Some(PacketType::List),
            b'u' => Some(PacketType::Update),
            _ => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PacketType::Create => "create",
            PacketType::Join => "join",
            PacketType::Leave => "leave",
            PacketType::List => "list",
            PacketType::Update => "update",
        };
        f.write_str(name)
    }
}

/// Reasons the tracker rejects a request
///
/// The byte on the wire depends on the request type, so the same code can
/// be encoded differently for create and join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RoomLimitReached,
    AlreadyInRoom,
    RoomFull,
    RoomNotFound,
    PeerNotFound,
}

impl ErrorCode {
    pub fn to_byte(self, kind: PacketType) -> u8 {
        match (self, kind) {
            (ErrorCode::RoomLimitReached, _) => b'o',
            (ErrorCode::AlreadyInRoom, PacketType::Join) => b'a',
            (ErrorCode::AlreadyInRoom, _) => b'e',
            (ErrorCode::RoomFull, _) => b'f',
            (ErrorCode::RoomNotFound, _) | (ErrorCode::PeerNotFound, _) => b'e',
        }
    }

    pub fn from_byte(kind: PacketType, byte: u8) -> Option<Self> {
        match (kind, byte) {
            (PacketType::Create, b'o') => Some(ErrorCode::RoomLimitReached),
            (PacketType::Create, b'e') => Some(ErrorCode::AlreadyInRoom),
            (PacketType::Join, b'f') => Some(ErrorCode::RoomFull),
            (PacketType::Join, b'e') => Some(ErrorCode::RoomNotFound),
            (PacketType::Join, b'a') => Some(ErrorCode::AlreadyInRoom),
            (PacketType::Leave, b'e') => Some(ErrorCode::PeerNotFound),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::RoomLimitReached => "room limit reached",
            ErrorCode::AlreadyInRoom => "already in room",
            ErrorCode::RoomFull => "room full",
            ErrorCode::RoomNotFound => "room not found",
            ErrorCode::PeerNotFound => "peer not found",
        };
        f.write_str(text)
    }
}

/// Errors raised while encoding or decoding datagrams
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("datagram of {0} bytes is shorter than the header")]
    Truncated(usize),

    #[error("unknown packet type {0:#04x}")]
    UnknownType(u8),

    #[error("{0} packets are never sent by peers")]
    NotARequest(PacketType),

    #[error("declared payload of {declared} bytes but only {available} received")]
    PayloadMismatch { declared: usize, available: usize },

    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("roster payload of {0} bytes is not a whole number of peer records")]
    MalformedRoster(usize),

    #[error("header codec failed: {0}")]
    Header(#[from] bincode::Error),
}

// bincode's default configuration writes fixed-width little-endian integers
// with no padding, which is exactly the packed header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Header {
    kind: u8,
    error: u8,
    room: u32,
    payload_length: u32,
}

/// A decoded datagram in either direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    /// Raw error byte; zero means success
    pub error: u8,
    pub room: RoomId,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(kind: PacketType, room: RoomId, payload: Vec<u8>) -> Self {
        Self {
            kind,
            error: 0,
            room,
            payload,
        }
    }

    /// Reply to a successful create carrying the allocated room
    pub fn created(room: RoomId) -> Self {
        Self::new(PacketType::Create, room, Vec::new())
    }

    /// Roster sent to the peer whose join triggered the broadcast
    pub fn joined(room: RoomId, roster: &[PeerEndpoint]) -> Self {
        Self::new(PacketType::Join, room, encode_roster(roster))
    }

    /// Roster sent to every other member of a room
    pub fn update(room: RoomId, roster: &[PeerEndpoint]) -> Self {
        Self::new(PacketType::Update, room, encode_roster(roster))
    }

    pub fn left(room: RoomId) -> Self {
        Self::new(PacketType::Leave, room, Vec::new())
    }

    pub fn room_list(text: String) -> Self {
        Self::new(PacketType::List, 0, text.into_bytes())
    }

    /// Error reply reusing the type of the rejected request
    pub fn error(kind: PacketType, code: ErrorCode, room: RoomId) -> Self {
        Self {
            kind,
            error: code.to_byte(kind),
            room,
            payload: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error != 0
    }

    /// Interprets the error byte for this packet's type
    pub fn error_code(&self) -> Option<ErrorCode> {
        if self.error == 0 {
            return None;
        }
        ErrorCode::from_byte(self.kind, self.error)
    }

    /// Decodes the payload of a join or update packet
    pub fn roster(&self) -> Result<Vec<PeerEndpoint>, ProtocolError> {
        decode_roster(&self.payload)
    }

    /// Payload as text, used for list replies
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                len: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let header = Header {
            kind: self.kind.as_byte(),
            error: self.error,
            room: self.room,
            payload_length: self.payload.len() as u32,
        };

        let mut data = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        data.extend_from_slice(&bincode::serialize(&header)?);
        data.extend_from_slice(&self.payload);
        Ok(data)
    }

    /// Decodes one datagram
    ///
    /// Bytes past the declared payload are ignored: some peers transmit
    /// their whole fixed-size packet buffer regardless of content.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::Truncated(data.len()));
        }

        let header: Header = bincode::deserialize(&data[..HEADER_SIZE])?;
        let kind =
            PacketType::from_byte(header.kind).ok_or(ProtocolError::UnknownType(header.kind))?;

        let declared = header.payload_length as usize;
        let available = data.len() - HEADER_SIZE;
        if declared > available {
            return Err(ProtocolError::PayloadMismatch {
                declared,
                available,
            });
        }

        Ok(Self {
            kind,
            error: header.error,
            room: header.room,
            payload: data[HEADER_SIZE..HEADER_SIZE + declared].to_vec(),
        })
    }
}

/// Requests a peer may send to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Create,
    Join { room: RoomId },
    Leave,
    List,
}

impl Request {
    pub fn kind(&self) -> PacketType {
        match self {
            Request::Create => PacketType::Create,
            Request::Join { .. } => PacketType::Join,
            Request::Leave => PacketType::Leave,
            Request::List => PacketType::List,
        }
    }

    /// Room field the request carries; only joins name a room
    pub fn room(&self) -> RoomId {
        match self {
            Request::Join { room } => *room,
            _ => 0,
        }
    }

    pub fn to_packet(self) -> Packet {
        Packet::new(self.kind(), self.room(), Vec::new())
    }

    pub fn encode(self) -> Result<Vec<u8>, ProtocolError> {
        self.to_packet().encode()
    }

    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        Packet::decode(data)?.try_into()
    }
}

impl TryFrom<Packet> for Request {
    type Error = ProtocolError;

    fn try_from(packet: Packet) -> Result<Self, Self::Error> {
        match packet.kind {
            PacketType::Create => Ok(Request::Create),
            PacketType::Join => Ok(Request::Join { room: packet.room }),
            PacketType::Leave => Ok(Request::Leave),
            PacketType::List => Ok(Request::List),
            PacketType::Update => Err(ProtocolError::NotARequest(packet.kind)),
        }
    }
}

/// Packs a roster into consecutive `sockaddr_in` records
pub fn encode_roster(roster: &[PeerEndpoint]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(roster.len() * PEER_RECORD_SIZE);
    for endpoint in roster {
        payload.extend_from_slice(&AF_INET.to_le_bytes());
        payload.extend_from_slice(&endpoint.port().to_be_bytes());
        payload.extend_from_slice(&endpoint.ip().octets());
        payload.extend_from_slice(&[0u8; 8]);
    }
    payload
}

pub fn decode_roster(payload: &[u8]) -> Result<Vec<PeerEndpoint>, ProtocolError> {
    if payload.len() % PEER_RECORD_SIZE != 0 {
        return Err(ProtocolError::MalformedRoster(payload.len()));
    }

    Ok(payload
        .chunks_exact(PEER_RECORD_SIZE)
        .map(|record| {
            let port = u16::from_be_bytes([record[2], record[3]]);
            let ip = Ipv4Addr::new(record[4], record[5], record[6], record[7]);
            SocketAddrV4::new(ip, port)
        })
        .collect())
}

/// Renders the list reply text, one line per room in the given order
///
/// Falls back to [`NO_ROOMS_TEXT`] when there are no rooms.
pub fn format_room_list<I>(rooms: I, max_room_size: usize) -> String
where
    I: IntoIterator<Item = (RoomId, usize)>,
{
    let mut text = String::new();
    for (room, occupants) in rooms {
        text.push_str(&format!(
            "room: {} - {}/{}\n",
            room, occupants, max_room_size
        ));
    }

    if text.is_empty() {
        NO_ROOMS_TEXT.to_string()
    } else {
        text
    }
}
