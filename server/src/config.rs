//! Tracker limits

use crate::error::TrackerError;
use shared::{format_room_list, RoomId, MAX_PAYLOAD_SIZE, PEER_RECORD_SIZE};

pub const DEFAULT_MAX_ROOMS: usize = 5;
pub const DEFAULT_MAX_ROOM_SIZE: usize = 5;

/// Capacity limits enforced by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Maximum number of rooms that may exist at the same time
    pub max_rooms: usize,
    /// Maximum number of peers in a single room
    pub max_room_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_rooms: DEFAULT_MAX_ROOMS,
            max_room_size: DEFAULT_MAX_ROOM_SIZE,
        }
    }
}

impl TrackerConfig {
    pub fn new(max_rooms: usize, max_room_size: usize) -> Self {
        Self {
            max_rooms,
            max_room_size,
        }
    }

    /// Highest room id that can ever be handed out
    ///
    /// Saturates at the largest id when twice the room limit does not fit.
    pub fn room_namespace(&self) -> RoomId {
        self.max_rooms
            .checked_mul(2)
            .and_then(|ids| RoomId::try_from(ids).ok())
            .unwrap_or(RoomId::MAX)
    }

    /// Checks that every reply the tracker can produce fits in one datagram
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.max_rooms == 0 {
            return Err(TrackerError::InvalidConfig(
                "room limit must be at least 1".to_string(),
            ));
        }
        if self.max_room_size == 0 {
            return Err(TrackerError::InvalidConfig(
                "room size limit must be at least 1".to_string(),
            ));
        }
        if self.max_rooms > u32::MAX as usize / 2 {
            return Err(TrackerError::InvalidConfig(format!(
                "room limit {} overflows the room id space",
                self.max_rooms
            )));
        }

        let roster_size = self.max_room_size.saturating_mul(PEER_RECORD_SIZE);
        if roster_size > MAX_PAYLOAD_SIZE {
            return Err(TrackerError::InvalidConfig(format!(
                "a roster of {} peers needs {} bytes, datagram payload holds {}",
                self.max_room_size, roster_size, MAX_PAYLOAD_SIZE
            )));
        }

        // Widest possible line repeated for every room
        let widest = format_room_list(
            [(self.room_namespace(), self.max_room_size)],
            self.max_room_size,
        );
        let list_size = widest.len().saturating_mul(self.max_rooms);
        if list_size > MAX_PAYLOAD_SIZE {
            return Err(TrackerError::InvalidConfig(format!(
                "a list of {} rooms needs up to {} bytes, datagram payload holds {}",
                self.max_rooms, list_size, MAX_PAYLOAD_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = TrackerConfig::default();
        assert_eq!(config.max_rooms, 5);
        assert_eq!(config.max_room_size, 5);
        assert_eq!(config.room_namespace(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_namespace_saturates() {
        assert_eq!(TrackerConfig::new(7, 5).room_namespace(), 14);
        assert_eq!(
            TrackerConfig::new(u32::MAX as usize / 2 + 1, 5).room_namespace(),
            RoomId::MAX
        );
        assert_eq!(TrackerConfig::new(usize::MAX, 5).room_namespace(), RoomId::MAX);
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(TrackerConfig::new(0, 5).validate().is_err());
        assert!(TrackerConfig::new(5, 0).validate().is_err());
    }

    #[test]
    fn test_roster_must_fit_datagram() {
        let fits = MAX_PAYLOAD_SIZE / PEER_RECORD_SIZE;
        assert!(TrackerConfig::new(5, fits).validate().is_ok());

        match TrackerConfig::new(5, fits + 1).validate() {
            Err(TrackerError::InvalidConfig(msg)) => assert!(msg.contains("roster")),
            other => panic!("Expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_room_list_must_fit_datagram() {
        match TrackerConfig::new(1000, 5).validate() {
            Err(TrackerError::InvalidConfig(msg)) => assert!(msg.contains("list")),
            other => panic!("Expected invalid config, got {:?}", other),
        }
    }
}
