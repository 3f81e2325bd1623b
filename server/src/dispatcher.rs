//! Request handling for the tracker
//!
//! The dispatcher owns the peer registry and applies one request at a time.
//! Each handler either commits its whole change and returns the packets to
//! send, or rejects the request without touching the registry. Rejections
//! become a single error reply to the requester.

use crate::allocator::RoomAllocator;
use crate::broadcast::{Delivery, MembershipBroadcaster};
use crate::config::TrackerConfig;
use crate::error::{HandlerError, RequestError, TrackerError};
use crate::registry::PeerRegistry;
use log::{debug, info, warn};
use shared::{format_room_list, Packet, PeerEndpoint, Request, RoomId};

pub struct Dispatcher {
    config: TrackerConfig,
    registry: PeerRegistry,
    allocator: RoomAllocator,
}

impl Dispatcher {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            registry: PeerRegistry::new(),
            allocator: RoomAllocator::new(&config),
        }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Applies a request and returns every packet it produces
    ///
    /// Only a fatal error is returned as `Err`; rejected requests yield an
    /// error reply addressed to the requester.
    pub fn handle(
        &mut self,
        request: Request,
        from: PeerEndpoint,
    ) -> Result<Vec<Delivery>, TrackerError> {
        debug!("{} request from {}", request.kind(), from);

        let outcome = match request {
            Request::Create => self.create(from),
            Request::Join { room } => self.join(from, room),
            Request::Leave => self.leave(from),
            Request::List => Ok(self.list(from)),
        };

        match outcome {
            Ok(deliveries) => Ok(deliveries),
            Err(HandlerError::Rejected(err)) => {
                // Full rooms and the room limit are normal under load
                if err.is_capacity() {
                    info!("Refused {} from {}: {}", request.kind(), from, err);
                } else {
                    warn!("Rejected {} from {}: {}", request.kind(), from, err);
                }
                let reply = Packet::error(request.kind(), err.code(), request.room());
                Ok(vec![Delivery::new(reply, from)])
            }
            Err(HandlerError::Fatal(err)) => Err(err),
        }
    }

    fn create(&mut self, from: PeerEndpoint) -> Result<Vec<Delivery>, HandlerError> {
        if let Some(room) = self.registry.room_of(&from) {
            return Err(RequestError::AlreadyInRoom(room).into());
        }

        let room = self.allocator.allocate(&self.registry)?;
        self.registry.assign(from, room);
        info!("{} created room {}", from, room);

        Ok(vec![Delivery::new(Packet::created(room), from)])
    }

    fn join(&mut self, from: PeerEndpoint, room: RoomId) -> Result<Vec<Delivery>, HandlerError> {
        // Occupancy is checked before the requester's current membership is
        // considered, so a room at the limit rejects every join into it.
        let occupants = self.registry.occupants(room);
        if occupants >= self.config.max_room_size {
            return Err(RequestError::RoomFull(room).into());
        }
        if occupants == 0 {
            return Err(RequestError::RoomNotFound(room).into());
        }
        if self.registry.room_of(&from) == Some(room) {
            return Err(RequestError::AlreadyInRoom(room).into());
        }

        let previous = self.registry.assign(from, room);
        let mut deliveries = MembershipBroadcaster::broadcast(&self.registry, room, Some(from));

        if let Some(old_room) = previous {
            deliveries.extend(MembershipBroadcaster::broadcast(
                &self.registry,
                old_room,
                None,
            ));
        }

        Ok(deliveries)
    }

    fn leave(&mut self, from: PeerEndpoint) -> Result<Vec<Delivery>, HandlerError> {
        let room = self
            .registry
            .remove(&from)
            .ok_or(RequestError::PeerNotFound)?;

        let mut deliveries = vec![Delivery::new(Packet::left(room), from)];
        deliveries.extend(MembershipBroadcaster::broadcast(&self.registry, room, None));
        Ok(deliveries)
    }

    fn list(&self, from: PeerEndpoint) -> Vec<Delivery> {
        let text = format_room_list(self.registry.rooms(), self.config.max_room_size);
        debug!("Room list for {}:\n{}", from, text);
        vec![Delivery::new(Packet::room_list(text), from)]
    }
}
