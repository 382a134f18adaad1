//! Wire protocol for Keyrace.
//!
//! This crate defines the language the typing-race client and server
//! speak:
//!
//! - **Types** ([`Player`], [`RoomSummary`], [`GameConfig`], ids) — the
//!   structures that travel on the wire.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the tagged event
//!   vocabulary for both directions.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw frames) and the
//! gateway (player identity). It knows nothing about connections,
//! rooms, or timers — only shapes and serialization.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    CaseMode, GameConfig, GameMode, GameUpdate, HandMode, Player, PlayerId,
    RoomId, RoomStatus, RoomSummary,
};
