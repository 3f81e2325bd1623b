//! Room id allocation under the global room limit

use crate::config::TrackerConfig;
use crate::error::{HandlerError, RequestError, TrackerError};
use crate::registry::PeerRegistry;
use log::debug;
use shared::RoomId;

/// Chooses free room ids from the namespace `1..=2 * max_rooms`
///
/// Ids are reused as soon as their last occupant leaves.
#[derive(Debug, Clone, Copy)]
pub struct RoomAllocator {
    max_rooms: usize,
    namespace: RoomId,
}

impl RoomAllocator {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            max_rooms: config.max_rooms,
            namespace: config.room_namespace(),
        }
    }

    /// Returns the lowest id no registered peer occupies
    ///
    /// Fails with a rejection when the room limit is reached, and fatally
    /// when no id is free although the limit check passed.
    pub fn allocate(&self, registry: &PeerRegistry) -> Result<RoomId, HandlerError> {
        let rooms = registry.room_count();
        if rooms >= self.max_rooms {
            debug!("Room limit reached ({}/{})", rooms, self.max_rooms);
            return Err(HandlerError::Rejected(RequestError::RoomLimitReached));
        }

        (1..=self.namespace)
            .find(|room| !registry.room_exists(*room))
            .ok_or(HandlerError::Fatal(TrackerError::NamespaceExhausted(
                self.namespace,
            )))
    }
}
