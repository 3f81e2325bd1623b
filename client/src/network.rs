use crate::error::ClientError;
use log::{debug, warn};
use shared::{Packet, PeerEndpoint, Request, RoomId, MAX_PACKET_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

/// How long request helpers wait for the matching reply
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// A peer's connection to the tracker
///
/// The socket is also the peer's identity: the tracker keys membership on
/// the endpoint requests come from, so every request for one peer must go
/// through the same client.
pub struct TrackerClient {
    socket: UdpSocket,
    tracker_addr: SocketAddr,
    reply_timeout: Duration,
}

impl TrackerClient {
    /// Binds an ephemeral port on the interface that can reach the tracker
    pub async fn connect(tracker_addr: &str) -> Result<Self, ClientError> {
        let tracker: SocketAddr = tracker_addr
            .parse()
            .map_err(|_| ClientError::InvalidAddress(tracker_addr.to_string()))?;

        let local = if tracker.ip().is_loopback() {
            "127.0.0.1:0"
        } else {
            "0.0.0.0:0"
        };
        Self::bind(local, tracker_addr).await
    }

    pub async fn bind(local_addr: &str, tracker_addr: &str) -> Result<Self, ClientError> {
        let tracker_addr = tracker_addr
            .parse()
            .map_err(|_| ClientError::InvalidAddress(tracker_addr.to_string()))?;
        let socket = UdpSocket::bind(local_addr).await?;
        debug!("Peer socket bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            tracker_addr,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        })
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn tracker_addr(&self) -> SocketAddr {
        self.tracker_addr
    }

    pub async fn send(&self, request: Request) -> Result<(), ClientError> {
        let data = request.encode()?;
        self.socket.send_to(&data, self.tracker_addr).await?;
        Ok(())
    }

    /// Waits for the next packet from the tracker
    ///
    /// Datagrams from other senders, such as peers in the same room, are
    /// skipped, and so are datagrams from the tracker that do not decode.
    pub async fn next_packet(&self) -> Result<Packet, ClientError> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];

        loop {
            let (len, from) = self.socket.recv_from(&mut buffer).await?;
            if from != self.tracker_addr {
                debug!("Skipping datagram from {}", from);
                continue;
            }
            match Packet::decode(&buffer[..len]) {
                Ok(packet) => return Ok(packet),
                Err(e) => warn!("Dropping malformed datagram from tracker: {}", e),
            }
        }
    }

    /// Like [`next_packet`](Self::next_packet) but gives up after `wait`
    pub async fn recv(&self, wait: Duration) -> Result<Packet, ClientError> {
        match tokio::time::timeout(wait, self.next_packet()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(wait)),
        }
    }

    /// Sends a request and waits for the reply of the same type
    ///
    /// Roster updates for this peer's room can arrive in between; they are
    /// skipped. Error replies become [`ClientError::Rejected`].
    pub async fn request(&self, request: Request) -> Result<Packet, ClientError> {
        self.send(request).await?;
        let deadline = Instant::now() + self.reply_timeout;

        loop {
            let packet = match timeout_at(deadline, self.next_packet()).await {
                Ok(result) => result?,
                Err(_) => return Err(ClientError::Timeout(self.reply_timeout)),
            };

            if packet.kind != request.kind() {
                debug!(
                    "Skipping {} packet while waiting for {} reply",
                    packet.kind,
                    request.kind()
                );
                continue;
            }

            if packet.is_error() {
                return Err(match packet.error_code() {
                    Some(code) => ClientError::Rejected {
                        kind: packet.kind,
                        code,
                    },
                    None => {
                        warn!("Unknown error byte {:#04x} from tracker", packet.error);
                        ClientError::UnknownError {
                            kind: packet.kind,
                            byte: packet.error,
                        }
                    }
                });
            }

            return Ok(packet);
        }
    }

    /// Creates a room and returns its id
    pub async fn create(&self) -> Result<RoomId, ClientError> {
        Ok(self.request(Request::Create).await?.room)
    }

    /// Joins (or switches to) a room and returns its roster
    pub async fn join(&self, room: RoomId) -> Result<Vec<PeerEndpoint>, ClientError> {
        let reply = self.request(Request::Join { room }).await?;
        Ok(reply.roster()?)
    }

    /// Leaves the current room and returns the room that was left
    pub async fn leave(&self) -> Result<RoomId, ClientError> {
        Ok(self.request(Request::Leave).await?.room)
    }

    /// Fetches the tracker's room list text
    pub async fn list(&self) -> Result<String, ClientError> {
        Ok(self.request(Request::List).await?.text())
    }
}
