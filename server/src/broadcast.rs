//! Roster fan-out after membership changes

use crate::registry::PeerRegistry;
use shared::{Packet, PeerEndpoint, RoomId};

/// A packet addressed to one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub packet: Packet,
    pub addr: PeerEndpoint,
}

impl Delivery {
    pub fn new(packet: Packet, addr: PeerEndpoint) -> Self {
        Self { packet, addr }
    }
}

/// Computes a room's roster and addresses a copy to every member
///
/// The roster is read from the registry at call time, so the deliveries
/// carry a snapshot taken while the caller holds the registry. Each member
/// finds its own address in the roster.
pub struct MembershipBroadcaster;

impl MembershipBroadcaster {
    /// Builds one packet per member of `room`
    ///
    /// `joined` receives a join reply; everyone else receives an update.
    /// An empty room produces nothing.
    pub fn broadcast(
        registry: &PeerRegistry,
        room: RoomId,
        joined: Option<PeerEndpoint>,
    ) -> Vec<Delivery> {
        let roster = registry.members(room);

        roster
            .iter()
            .map(|member| {
                let packet = if Some(*member) == joined {
                    Packet::joined(room, &roster)
                } else {
                    Packet::update(room, &roster)
                };
                Delivery::new(packet, *member)
            })
            .collect()
    }
}
