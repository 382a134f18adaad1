//! Connection identity for Keyrace.
//!
//! The gateway's connection → (player, room) lookup lives here, along
//! with the machinery that lets a player survive a transport drop:
//!
//! 1. **Binding** — a connection that creates/joins a room gets a
//!    session and a secret reconnect token ([`SessionManager::bind`])
//! 2. **Grace windows** — a dropped connection holds its room slot for
//!    a configurable period ([`SessionManager::disconnect`])
//! 3. **Resumption** — a returning connection presents the token and
//!    reclaims the slot ([`SessionManager::resume`])
//!
//! Sessions are a back-reference over room state, never authoritative:
//! the room registry can outlive, and is never corrupted by, anything
//! that happens to a session.

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{DisconnectTicket, SessionManager};
pub use session::{Session, SessionConfig, SessionState};
