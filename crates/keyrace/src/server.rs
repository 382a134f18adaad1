//! Server assembly: the accept loop and the shared state every
//! connection task works against.
//!
//! # Concurrency model
//!
//! All mutable state — the room registry, the session manager, and the
//! broadcast hub — lives in one [`Core`] behind a single async `Mutex`.
//! Every client event is handled as one lock-hold: mutate, queue the
//! resulting broadcasts on the hub, release. Since the hub only queues
//! (per-connection writer tasks do the socket I/O outside the lock),
//! nothing suspends while the lock is held, and the order clients see
//! events in is exactly the order mutations happened in.

use std::net::SocketAddr;
use std::sync::Arc;

use keyrace_protocol::JsonCodec;
use keyrace_registry::RoomRegistry;
use keyrace_session::{SessionConfig, SessionManager};
use keyrace_transport::{Transport, TransportError, WebSocketTransport};
use tokio::sync::Mutex;

use crate::hub::BroadcastHub;
use crate::{gateway, KeyraceError};

/// Everything the single lock protects.
pub(crate) struct Core {
    pub(crate) registry: RoomRegistry,
    pub(crate) sessions: SessionManager,
    pub(crate) hub: BroadcastHub,
}

/// Shared by every connection task and timer.
pub(crate) struct ServerState {
    pub(crate) core: Mutex<Core>,
    pub(crate) codec: JsonCodec,
}

/// Configures and builds a [`KeyraceServer`].
pub struct KeyraceServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl KeyraceServerBuilder {
    /// The address the WebSocket listener binds to.
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Overrides the session settings (reconnect grace window).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// # Errors
    /// Returns a transport error if the address cannot be bound.
    pub async fn build(self) -> Result<KeyraceServer, KeyraceError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            core: Mutex::new(Core {
                registry: RoomRegistry::new(),
                sessions: SessionManager::new(self.session_config),
                hub: BroadcastHub::new(),
            }),
            codec: JsonCodec,
        });
        Ok(KeyraceServer { transport, state })
    }
}

impl Default for KeyraceServerBuilder {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            session_config: SessionConfig::default(),
        }
    }
}

/// The typing-race coordination server.
pub struct KeyraceServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl KeyraceServer {
    pub fn builder() -> KeyraceServerBuilder {
        KeyraceServerBuilder::default()
    }

    /// The listener's bound address. Useful with port 0 in tests.
    ///
    /// # Errors
    /// Returns a transport error if the listener socket is gone.
    pub fn local_addr(&self) -> Result<SocketAddr, KeyraceError> {
        Ok(self
            .transport
            .local_addr()
            .map_err(TransportError::AddrUnavailable)?)
    }

    /// Accepts connections forever, one gateway task per connection.
    /// Returns only if the listener itself fails.
    ///
    /// # Errors
    /// Returns a transport error if `accept` fails.
    pub async fn run(mut self) -> Result<(), KeyraceError> {
        tracing::info!("server running, accepting connections");
        loop {
            let conn = self.transport.accept().await?;
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                gateway::handle_connection(conn, state).await;
            });
        }
    }
}
