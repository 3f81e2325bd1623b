//! # Rendezvous Tracker Library
//!
//! This library implements the tracker of a peer-to-peer chat protocol. Peers
//! only talk to the tracker to create, join, list, or leave rooms; once they
//! know who else is in their room they exchange messages with each other
//! directly. The tracker keeps the authoritative membership and tells every
//! affected peer whenever it changes.
//!
//! ## Core Responsibilities
//!
//! ### Membership
//! Each peer is identified by the IPv4 endpoint its requests arrive from and
//! occupies at most one room. Rooms have no state of their own: a room exists
//! while somebody is in it and its id becomes reusable when the last peer
//! leaves.
//!
//! ### Capacity
//! Two limits apply, both configurable: the number of rooms that may exist at
//! once and the number of peers per room. Room ids are drawn from
//! `1..=2 * max_rooms`, lowest free id first.
//!
//! ### Roster Broadcasting
//! Every successful join, switch, or leave sends the affected rooms' rosters
//! to all of their members. The joining peer receives a join reply; everyone
//! else an update. Both carry the full roster, the recipient included.
//!
//! ## Architecture Design
//!
//! ### Sequential Dispatch
//! Requests are applied one at a time by a single loop that owns the
//! registry, so every capacity check sees a consistent state. Rosters are
//! captured inside that loop and handed to a sender task as finished packets.
//!
//! ### Best-Effort Delivery
//! Replies travel over UDP without acknowledgement. A failed send is logged
//! and dropped; the membership change that caused it is never rolled back.
//! Peers stay registered until they send an explicit leave.
//!
//! ## Module Organization
//!
//! - `registry`: endpoint to room mapping, the only mutable state
//! - `allocator`: room id selection under the room limit
//! - `broadcast`: roster computation and per-member packets
//! - `dispatcher`: request handlers and error replies
//! - `network`: UDP receiver, dispatch loop, and sender tasks
//! - `config`: capacity limits and their validation
//! - `error`: rejection, transport, and fatal error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use tracker::config::TrackerConfig;
//! use tracker::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("0.0.0.0:8080", TrackerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod broadcast;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod network;
pub mod registry;
