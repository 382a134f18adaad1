//! Authoritative room state for Keyrace.
//!
//! The registry is the single source of truth for rooms and the players
//! inside them. Every mutation is synchronous and atomic from the
//! caller's perspective; the server serializes access behind one lock,
//! so no internal locking lives here.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — owns all rooms; lifecycle, readiness, progress,
//!   and quick-match placement
//! - [`Room`] — one race instance and its players
//! - [`PlayerIdentity`] — the fields a joining player arrives with
//! - [`RegistryError`] — join failures surfaced to clients

mod charset;
mod error;
mod registry;
mod room;

pub use charset::{generate_sequence, sequence_len};
pub use error::RegistryError;
pub use registry::RoomRegistry;
pub use room::{PlayerIdentity, Room, MAX_PLAYERS};
