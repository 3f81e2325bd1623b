//! Tracker network layer handling UDP communications around the dispatcher

use crate::broadcast::Delivery;
use crate::config::TrackerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{TrackerError, TransportError};
use log::{debug, error, info, warn};
use shared::{Packet, PeerEndpoint, Request, MAX_PACKET_SIZE};
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Messages sent from network tasks to the dispatch loop
#[derive(Debug)]
pub enum ServerMessage {
    RequestReceived {
        request: Request,
        addr: PeerEndpoint,
    },
    Shutdown,
}

/// Stops a running [`Server`] from another task
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Tracker already stopped");
        }
    }
}

/// Aborts the network tasks when the dispatch loop exits
///
/// The receiver holds a socket reference and only notices a closed channel on
/// its next datagram, so it must be stopped for the port to be released.
struct NetworkTasks(Vec<JoinHandle<()>>);

impl Drop for NetworkTasks {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// Tracker server owning the socket and the membership state
///
/// A receiver task decodes datagrams and forwards requests to the dispatch
/// loop, which applies them strictly one at a time. The loop hands every
/// resulting packet to a sender task, so registry access never overlaps.
pub struct Server {
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<Delivery>,
    outbound_rx: mpsc::UnboundedReceiver<Delivery>,
}

impl Server {
    pub async fn new(addr: &str, config: TrackerConfig) -> Result<Self, TrackerError> {
        config.validate()?;

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TrackerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(
            "Tracker listening on {} ({} rooms of {} peers)",
            addr, config.max_rooms, config.max_room_size
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket: Arc::new(socket),
            dispatcher: Dispatcher::new(config),
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Spawns task that continuously listens for incoming requests
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let Some(addr) = peer_endpoint(addr) else {
                            warn!("Ignoring datagram from non-IPv4 sender {}", addr);
                            continue;
                        };

                        match Request::decode(&buffer[..len]) {
                            Ok(request) => {
                                if let Err(e) =
                                    server_tx.send(ServerMessage::RequestReceived { request, addr })
                                {
                                    error!("Failed to send request to dispatch loop: {}", e);
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping datagram from {}: {}", addr, e),
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that processes the outgoing packet queue
    fn spawn_network_sender(&mut self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let mut outbound_rx = std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(delivery) = outbound_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &delivery.packet, delivery.addr).await
                {
                    error!(
                        "Failed to send {} packet to {}: {}",
                        delivery.packet.kind, delivery.addr, e
                    );
                }
            }
        })
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: PeerEndpoint,
    ) -> Result<(), TransportError> {
        let data = packet.encode()?;
        socket.send_to(&data, SocketAddr::V4(addr)).await?;
        Ok(())
    }

    /// Main loop applying requests in arrival order
    ///
    /// Returns when shut down, or with an error when the membership state
    /// can no longer be trusted. The network tasks stop with it on every
    /// path, so dropping the server afterwards frees the port.
    pub async fn run(&mut self) -> Result<(), TrackerError> {
        let _tasks = NetworkTasks(vec![
            self.spawn_network_receiver(),
            self.spawn_network_sender(),
        ]);

        info!("Tracker started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::RequestReceived { request, addr }) => {
                    let deliveries = self.dispatcher.handle(request, addr)?;
                    for delivery in deliveries {
                        if self.outbound_tx.send(delivery).is_err() {
                            error!("Outgoing packet queue closed");
                            return Err(TrackerError::ChannelClosed);
                        }
                    }
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Tracker shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Peers are keyed by IPv4 endpoint; IPv4-mapped IPv6 senders are unwrapped
fn peer_endpoint(addr: SocketAddr) -> Option<PeerEndpoint> {
    match addr {
        SocketAddr::V4(addr) => Some(addr),
        SocketAddr::V6(addr) => addr
            .ip()
            .to_ipv4_mapped()
            .map(|ip| SocketAddrV4::new(ip, addr.port())),
    }
}
