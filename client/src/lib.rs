//! # Peer Client Library
//!
//! Peer-side access to the rendezvous tracker. A peer uses the tracker only
//! to manage its room membership; chat traffic then flows directly between
//! the peers named in the roster.
//!
//! ## Membership Lifecycle
//!
//! A peer creates a room or joins an existing one, may switch by joining
//! another room, and leaves explicitly. The tracker never expires idle
//! peers, so a peer that stops without leaving stays in its room.
//!
//! ## Roster Updates
//!
//! Whenever somebody enters or leaves the peer's room, the tracker pushes an
//! `update` packet with the full roster. [`TrackerClient::next_packet`]
//! surfaces these; the request helpers skip them while waiting for their own
//! reply.
//!
//! ## Reliability
//!
//! Requests and replies are single UDP datagrams without retransmission.
//! Request helpers give up after a timeout and report
//! [`ClientError::Timeout`]; retrying is the caller's choice.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use peer::TrackerClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TrackerClient::connect("127.0.0.1:8080").await?;
//!     let room = client.create().await?;
//!     println!("Created room {}", room);
//!     print!("{}", client.list().await?);
//!     client.leave().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod network;

pub use error::ClientError;
pub use network::TrackerClient;
