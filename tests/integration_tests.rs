//! Integration tests for the tracker and its peer client
//!
//! These tests run a real tracker on a loopback socket and drive it through
//! peer clients, validating membership changes and roster broadcasts end to end.

use peer::{ClientError, TrackerClient};
use shared::{ErrorCode, Packet, PacketType, PeerEndpoint, Request, NO_ROOMS_TEXT};
use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracker::config::TrackerConfig;
use tracker::network::{Server, ShutdownHandle};

const WAIT: Duration = Duration::from_millis(500);

async fn start_tracker(config: TrackerConfig) -> (String, ShutdownHandle) {
    let mut server = Server::new("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let handle = server.shutdown_handle();

    tokio::spawn(async move {
        server.run().await.unwrap();
    });

    (addr, handle)
}

async fn spawn_peer(tracker: &str) -> (TrackerClient, PeerEndpoint) {
    let client = TrackerClient::connect(tracker).await.unwrap();
    let endpoint = match client.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(addr) => panic!("Expected IPv4 peer, got {}", addr),
    };
    (client, endpoint)
}

fn assert_rejected<T: std::fmt::Debug>(result: Result<T, ClientError>, expected: ErrorCode) {
    match result {
        Err(ClientError::Rejected { code, .. }) => assert_eq!(code, expected),
        other => panic!("Expected {:?} rejection, got {:?}", expected, other),
    }
}

/// MEMBERSHIP LIFECYCLE TESTS
mod membership_tests {
    use super::*;

    /// Create, join, leave, leave, list: the reference walkthrough
    #[tokio::test]
    async fn create_join_leave_walkthrough() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let (a, a_addr) = spawn_peer(&tracker).await;
        let (b, b_addr) = spawn_peer(&tracker).await;

        assert_eq!(a.create().await.unwrap(), 1);

        let roster = b.join(1).await.unwrap();
        assert_eq!(roster, vec![a_addr, b_addr]);

        let update = a.recv(WAIT).await.unwrap();
        assert_eq!(update.kind, PacketType::Update);
        assert_eq!(update.room, 1);
        assert_eq!(update.roster().unwrap(), vec![a_addr, b_addr]);

        assert_eq!(a.leave().await.unwrap(), 1);
        let update = b.recv(WAIT).await.unwrap();
        assert_eq!(update.kind, PacketType::Update);
        assert_eq!(update.roster().unwrap(), vec![b_addr]);

        assert_eq!(b.leave().await.unwrap(), 1);
        assert_eq!(a.list().await.unwrap(), NO_ROOMS_TEXT);

        handle.shutdown();
    }

    /// Switching rooms updates both the new and the old room
    #[tokio::test]
    async fn switch_updates_both_rooms() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let (a, a_addr) = spawn_peer(&tracker).await;
        let (b, b_addr) = spawn_peer(&tracker).await;
        let (c, c_addr) = spawn_peer(&tracker).await;

        assert_eq!(a.create().await.unwrap(), 1);
        b.join(1).await.unwrap();
        a.recv(WAIT).await.unwrap();
        assert_eq!(c.create().await.unwrap(), 2);

        let roster = b.join(2).await.unwrap();
        assert_eq!(roster, vec![c_addr, b_addr]);

        let to_c = c.recv(WAIT).await.unwrap();
        assert_eq!(to_c.kind, PacketType::Update);
        assert_eq!(to_c.room, 2);
        assert_eq!(to_c.roster().unwrap(), vec![c_addr, b_addr]);

        let to_a = a.recv(WAIT).await.unwrap();
        assert_eq!(to_a.kind, PacketType::Update);
        assert_eq!(to_a.room, 1);
        assert_eq!(to_a.roster().unwrap(), vec![a_addr]);

        assert_eq!(
            a.list().await.unwrap(),
            "room: 1 - 1/5\nroom: 2 - 2/5\n"
        );

        handle.shutdown();
    }

    /// A freed room id is handed out again
    #[tokio::test]
    async fn room_ids_are_reused() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let (a, _) = spawn_peer(&tracker).await;
        let (b, _) = spawn_peer(&tracker).await;

        assert_eq!(a.create().await.unwrap(), 1);
        assert_eq!(b.create().await.unwrap(), 2);
        a.leave().await.unwrap();
        assert_eq!(a.create().await.unwrap(), 1);

        handle.shutdown();
    }
}

/// REJECTION TESTS
mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn room_limit_reached() {
        let (tracker, handle) = start_tracker(TrackerConfig::new(2, 5)).await;
        let (a, _) = spawn_peer(&tracker).await;
        let (b, _) = spawn_peer(&tracker).await;
        let (c, _) = spawn_peer(&tracker).await;

        a.create().await.unwrap();
        b.create().await.unwrap();
        assert_rejected(c.create().await, ErrorCode::RoomLimitReached);

        handle.shutdown();
    }

    #[tokio::test]
    async fn join_errors() {
        let (tracker, handle) = start_tracker(TrackerConfig::new(5, 2)).await;
        let (a, _) = spawn_peer(&tracker).await;
        let (b, _) = spawn_peer(&tracker).await;
        let (c, _) = spawn_peer(&tracker).await;

        assert_rejected(a.join(1).await, ErrorCode::RoomNotFound);

        let room = a.create().await.unwrap();
        assert_rejected(a.create().await, ErrorCode::AlreadyInRoom);

        b.join(room).await.unwrap();
        assert_rejected(c.join(room).await, ErrorCode::RoomFull);

        handle.shutdown();
    }

    #[tokio::test]
    async fn leave_without_room() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let (a, _) = spawn_peer(&tracker).await;

        assert_rejected(a.leave().await, ErrorCode::PeerNotFound);

        handle.shutdown();
    }
}

/// WIRE COMPATIBILITY TESTS
mod wire_tests {
    use super::*;

    async fn raw_exchange(socket: &UdpSocket, tracker: &str, data: &[u8]) -> Option<Packet> {
        socket.send_to(data, tracker).await.unwrap();
        let mut buf = [0u8; shared::MAX_PACKET_SIZE];
        match tokio::time::timeout(WAIT, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(Packet::decode(&buf[..len]).unwrap()),
            _ => None,
        }
    }

    /// Unknown packet types get no reply at all
    #[tokio::test]
    async fn unknown_type_is_ignored() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let reply = raw_exchange(&socket, &tracker, &[b'?', 0, 0, 0, 0, 0, 0, 0, 0, 0]).await;
        assert!(reply.is_none());

        handle.shutdown();
    }

    /// Peers that send a whole fixed-size packet buffer are understood
    #[tokio::test]
    async fn padded_request_is_accepted() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut data = Request::Create.encode().unwrap();
        data.resize(1024, 0);

        let reply = raw_exchange(&socket, &tracker, &data).await.expect("no reply");
        assert_eq!(reply.kind, PacketType::Create);
        assert_eq!(reply.error, 0);
        assert_eq!(reply.room, 1);

        handle.shutdown();
    }

    /// Roster records decode into the sender's own socket address
    #[tokio::test]
    async fn roster_contains_recipient() {
        let (tracker, handle) = start_tracker(TrackerConfig::default()).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let own: SocketAddrV4 = match socket.local_addr().unwrap() {
            SocketAddr::V4(addr) => addr,
            other => panic!("Expected IPv4, got {}", other),
        };

        let (a, _) = spawn_peer(&tracker).await;
        let room = a.create().await.unwrap();

        let reply = raw_exchange(&socket, &tracker, &Request::Join { room }.encode().unwrap())
            .await
            .expect("no join reply");
        assert_eq!(reply.kind, PacketType::Join);
        assert!(reply.roster().unwrap().contains(&own));

        handle.shutdown();
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;

    /// Simultaneous joins never push a room past its size limit
    #[tokio::test]
    async fn concurrent_joins_respect_room_size() {
        let (tracker, handle) = start_tracker(TrackerConfig::new(5, 3)).await;
        let (owner, _) = spawn_peer(&tracker).await;
        let room = owner.create().await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let tracker = tracker.clone();
            tasks.push(tokio::spawn(async move {
                let (client, _) = spawn_peer(&tracker).await;
                client.join(room).await.is_ok()
            }));
        }

        let mut joined = 0;
        for task in tasks {
            if task.await.unwrap() {
                joined += 1;
            }
        }

        assert_eq!(joined, 2);
        assert_eq!(owner.list().await.unwrap(), "room: 1 - 3/3\n");

        handle.shutdown();
    }
}
