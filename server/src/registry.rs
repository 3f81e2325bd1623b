//! Peer membership registry for the tracker
//!
//! The registry is the only mutable state the tracker has. It maps each
//! peer endpoint to the room it currently occupies. Rooms are not stored
//! separately: a room exists exactly while at least one peer names it, so
//! occupancy and existence are always derived from the peer entries.
//!
//! Every entry also records when the peer entered its room. Rosters are
//! ordered by that stamp so all members see the same, stable ordering.

use log::info;
use shared::{PeerEndpoint, RoomId};
use std::collections::{BTreeMap, HashMap};

/// A registered peer and the room it occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    /// Network endpoint the peer's requests come from
    pub endpoint: PeerEndpoint,
    /// Room the peer is currently in
    pub room: RoomId,
    /// Position of this membership in entry order
    entered: u64,
}

/// Mapping from peer endpoint to current room membership
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerEndpoint, Peer>,
    next_entry: u64,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room the endpoint is registered in, if any
    pub fn room_of(&self, endpoint: &PeerEndpoint) -> Option<RoomId> {
        self.peers.get(endpoint).map(|peer| peer.room)
    }

    pub fn contains(&self, endpoint: &PeerEndpoint) -> bool {
        self.peers.contains_key(endpoint)
    }

    /// Places the endpoint in `room`
    ///
    /// A new endpoint is registered; a registered one is moved in place.
    /// Returns the room the endpoint occupied before, if any. Either way the
    /// peer counts as the newest member of `room`.
    pub fn assign(&mut self, endpoint: PeerEndpoint, room: RoomId) -> Option<RoomId> {
        let entered = self.next_entry;
        self.next_entry += 1;

        let previous = self
            .peers
            .insert(
                endpoint,
                Peer {
                    endpoint,
                    room,
                    entered,
                },
            )
            .map(|peer| peer.room);

        match previous {
            Some(old_room) => info!("{} moved from room {} to {}", endpoint, old_room, room),
            None => info!("{} entered room {}", endpoint, room),
        }
        previous
    }

    /// Unregisters the endpoint, returning the room it left
    pub fn remove(&mut self, endpoint: &PeerEndpoint) -> Option<RoomId> {
        let peer = self.peers.remove(endpoint)?;
        info!("{} left room {}", endpoint, peer.room);
        Some(peer.room)
    }

    /// Number of peers currently in `room`
    pub fn occupants(&self, room: RoomId) -> usize {
        self.peers.values().filter(|peer| peer.room == room).count()
    }

    /// A room exists while anyone is in it
    pub fn room_exists(&self, room: RoomId) -> bool {
        self.peers.values().any(|peer| peer.room == room)
    }

    /// Number of distinct rooms with at least one occupant
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Occupant count per active room, ascending by room id
    pub fn rooms(&self) -> BTreeMap<RoomId, usize> {
        let mut rooms = BTreeMap::new();
        for peer in self.peers.values() {
            *rooms.entry(peer.room).or_insert(0) += 1;
        }
        rooms
    }

    /// Endpoints in `room`, oldest membership first
    pub fn members(&self, room: RoomId) -> Vec<PeerEndpoint> {
        let mut members: Vec<&Peer> = self
            .peers
            .values()
            .filter(|peer| peer.room == room)
            .collect();
        members.sort_by_key(|peer| peer.entered);
        members.into_iter().map(|peer| peer.endpoint).collect()
    }

    /// Every endpoint with its room, sorted by endpoint
    pub fn memberships(&self) -> Vec<(PeerEndpoint, RoomId)> {
        let mut entries: Vec<(PeerEndpoint, RoomId)> = self
            .peers
            .values()
            .map(|peer| (peer.endpoint, peer.room))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
