//! Keyrace: a real-time multiplayer typing-race server.
//!
//! Ties the layer crates together: `keyrace-transport` accepts
//! WebSocket connections, `keyrace-protocol` defines the event
//! vocabulary, `keyrace-session` tracks who each connection speaks for,
//! and `keyrace-registry` owns room and player state. This crate adds
//! the gateway (one task per connection), the broadcast hub, and the
//! one-shot timers for race duration and disconnect grace.
//!
//! ```no_run
//! use keyrace::KeyraceServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), keyrace::KeyraceError> {
//!     let server = KeyraceServer::builder()
//!         .bind_addr("127.0.0.1:3001")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod gateway;
mod hub;
mod server;
mod timers;

pub use error::KeyraceError;
pub use server::{KeyraceServer, KeyraceServerBuilder};

// Re-exported so embedders and tests can tune the grace window without
// depending on the session crate directly.
pub use keyrace_session::SessionConfig;
