//! The session gateway: one task per connection, translating wire
//! events into registry operations and hub broadcasts.
//!
//! Each connection gets two tasks: this read loop, and a writer task
//! that drains the connection's hub queue onto the socket. All state
//! access happens inside a single lock-hold per event; the writer does
//! the actual network sends outside the lock.

use std::sync::Arc;

use keyrace_protocol::{
    ClientEvent, Codec, GameConfig, GameUpdate, PlayerId, RoomId, ServerEvent,
};
use keyrace_registry::PlayerIdentity;
use keyrace_transport::{Connection, ConnectionId, WebSocketConnection};
use rand::Rng;

use crate::server::ServerState;
use crate::timers;

/// Longest race a client may configure, in seconds. The sequence is
/// sized at three chars per second and allocated up front, so an
/// unchecked duration is an unchecked allocation.
const MAX_RACE_DURATION_SECS: u64 = 600;

/// Where a join request wants the player placed.
enum Placement {
    Create { name: String, config: GameConfig },
    Join { room_id: RoomId },
    QuickMatch { config: GameConfig },
}

/// Drives one connection from accept to close.
pub(crate) async fn handle_connection(conn: WebSocketConnection, state: Arc<ServerState>) {
    let conn_id = conn.id();
    let conn = Arc::new(conn);
    tracing::info!(%conn_id, "connection established");

    let mut events = state.core.lock().await.hub.register(conn_id);

    // Writer task: socket sends happen here, never under the core lock.
    // Ends on its own once the hub drops this connection's sender.
    let writer_conn = Arc::clone(&conn);
    let writer_codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let bytes = match writer_codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::error!(%conn_id, %err, "failed to encode event");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    loop {
        match conn.recv().await {
            Ok(Some(bytes)) => match state.codec.decode::<ClientEvent>(&bytes) {
                Ok(event) => dispatch(conn_id, event, &state).await,
                Err(err) => {
                    tracing::debug!(%conn_id, %err, "unparseable client event");
                    let core = state.core.lock().await;
                    core.hub.send_to(
                        conn_id,
                        ServerEvent::Error {
                            message: "unrecognized event".to_string(),
                        },
                    );
                }
            },
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(%conn_id, %err, "connection error");
                break;
            }
        }
    }

    handle_disconnect(conn_id, &state).await;
    let _ = writer.await;
    tracing::info!(%conn_id, "connection closed");
}

async fn dispatch(conn_id: ConnectionId, event: ClientEvent, state: &Arc<ServerState>) {
    match event {
        ClientEvent::RoomCreate {
            name,
            config,
            player_name,
        } => {
            handle_join(conn_id, state, player_name, Placement::Create { name, config })
                .await;
        }
        ClientEvent::RoomJoin {
            room_id,
            player_name,
        } => {
            handle_join(conn_id, state, player_name, Placement::Join { room_id }).await;
        }
        ClientEvent::RoomQuickMatch {
            config,
            player_name,
        } => {
            handle_join(conn_id, state, player_name, Placement::QuickMatch { config })
                .await;
        }
        ClientEvent::RoomLeave => handle_leave(conn_id, state).await,
        ClientEvent::RoomList => {
            let core = state.core.lock().await;
            let rooms = core.registry.waiting_rooms();
            core.hub.send_to(conn_id, ServerEvent::RoomList { rooms });
        }
        ClientEvent::PlayerReady { is_ready } => {
            handle_ready(conn_id, state, is_ready).await;
        }
        ClientEvent::GameInput { is_correct, .. } => {
            handle_input(conn_id, state, is_correct).await;
        }
        ClientEvent::SessionResume { token } => {
            handle_resume(conn_id, state, &token).await;
        }
    }
}

/// Shared path for create, join, and quick-match: place the player,
/// bind the session, wire up broadcasts.
async fn handle_join(
    conn_id: ConnectionId,
    state: &Arc<ServerState>,
    player_name: String,
    placement: Placement,
) {
    let mut guard = state.core.lock().await;
    let core = &mut *guard;

    if player_name.trim().is_empty() {
        core.hub.send_to(
            conn_id,
            ServerEvent::Error {
                message: "player name is required".to_string(),
            },
        );
        return;
    }
    let requested_duration = match &placement {
        Placement::Create { config, .. } | Placement::QuickMatch { config } => {
            Some(config.duration)
        }
        Placement::Join { .. } => None,
    };
    if let Some(duration) = requested_duration {
        if duration == 0 || duration > MAX_RACE_DURATION_SECS {
            core.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: format!(
                        "duration must be between 1 and {MAX_RACE_DURATION_SECS} seconds"
                    ),
                },
            );
            return;
        }
    }
    if core.sessions.identity(conn_id).is_some() {
        core.hub.send_to(
            conn_id,
            ServerEvent::Error {
                message: "already in a room".to_string(),
            },
        );
        return;
    }

    let identity = PlayerIdentity {
        id: generate_player_id(),
        socket_id: conn_id.to_string(),
        name: player_name,
        avatar: None,
    };
    let player_id = identity.id.clone();

    let placed = match placement {
        Placement::Create { name, config } => {
            Ok(core.registry.create_room(name, config, identity))
        }
        Placement::Join { room_id } => core.registry.join_room(&room_id, identity),
        Placement::QuickMatch { config } => core.registry.quick_match(config, identity),
    };
    let room = match placed {
        Ok(room) => room,
        Err(err) => {
            tracing::debug!(%conn_id, %err, "join rejected");
            core.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            );
            return;
        }
    };

    let room_id = room.id.clone();
    let summary = room.summary();
    let players = room.players().to_vec();
    // More than one member means this player entered an existing room
    // and the others need a player:joined.
    let joined_player = (players.len() > 1)
        .then(|| players.iter().find(|p| p.id == player_id).cloned())
        .flatten();

    let session_token = match core.sessions.bind(conn_id, player_id.clone(), room_id.clone())
    {
        Ok(session) => session.token.clone(),
        Err(err) => {
            // Membership was granted above; take it back.
            core.registry.leave_room(&room_id, &player_id);
            core.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            );
            return;
        }
    };

    core.hub.subscribe(conn_id, room_id.clone());
    if let Some(player) = joined_player {
        core.hub
            .send_room_except(&room_id, conn_id, ServerEvent::PlayerJoined { player });
    }
    core.hub.send_to(
        conn_id,
        ServerEvent::RoomJoined {
            room: summary,
            players,
            session_token,
        },
    );

    let rooms = core.registry.waiting_rooms();
    core.hub.send_all(ServerEvent::RoomList { rooms });
}

async fn handle_leave(conn_id: ConnectionId, state: &Arc<ServerState>) {
    let mut guard = state.core.lock().await;
    let core = &mut *guard;

    // Leaving while in no room is a no-op, not an error.
    let Some((player_id, room_id)) = core.sessions.unbind(conn_id) else {
        return;
    };

    core.hub.unsubscribe(conn_id);
    core.registry.leave_room(&room_id, &player_id);
    core.hub
        .send_room(&room_id, ServerEvent::PlayerLeft { player_id });
    core.hub.send_to(conn_id, ServerEvent::RoomLeft);

    let rooms = core.registry.waiting_rooms();
    core.hub.send_all(ServerEvent::RoomList { rooms });
}

async fn handle_ready(conn_id: ConnectionId, state: &Arc<ServerState>, is_ready: bool) {
    let room_id;
    let armed;
    {
        let mut guard = state.core.lock().await;
        let core = &mut *guard;

        let Some((player_id, id)) = core.sessions.identity(conn_id) else {
            core.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: "join a room first".to_string(),
                },
            );
            return;
        };
        room_id = id;

        if !core.registry.set_player_ready(&room_id, &player_id, is_ready) {
            return;
        }
        core.hub.send_room(
            &room_id,
            ServerEvent::PlayerReady {
                player_id,
                is_ready,
            },
        );

        // The last ready flag going up is the start trigger.
        armed = if is_ready && core.registry.all_players_ready(&room_id) {
            core.registry.start_game(&room_id).map(|room| {
                (
                    room.round,
                    room.game_config.duration,
                    room.char_sequence.clone(),
                    room.start_time.unwrap_or(0),
                )
            })
        } else {
            None
        };

        if let Some((_, _, ref char_sequence, start_time)) = armed {
            core.hub.send_room(
                &room_id,
                ServerEvent::GameStart {
                    char_sequence: char_sequence.clone(),
                    start_time,
                },
            );
        }
    }

    // Arm the duration timer only after the lock is released.
    if let Some((round, duration, _, _)) = armed {
        timers::spawn_game_timer(Arc::clone(state), room_id, round, duration);
    }
}

async fn handle_input(conn_id: ConnectionId, state: &Arc<ServerState>, is_correct: bool) {
    let mut guard = state.core.lock().await;
    let core = &mut *guard;

    // Input from outside a room or outside a round is dropped, not an
    // error — keystrokes race the game:end broadcast and late ones are
    // expected.
    let Some((player_id, room_id)) = core.sessions.identity(conn_id) else {
        return;
    };
    if !core
        .registry
        .update_player_progress(&room_id, &player_id, is_correct)
    {
        return;
    }

    let updates = core.registry.room(&room_id).map(|room| {
        room.players()
            .iter()
            .map(|p| GameUpdate {
                player_id: p.id.clone(),
                score: p.score,
                errors: p.errors,
                current_index: p.current_index,
            })
            .collect::<Vec<_>>()
    });
    if let Some(updates) = updates {
        core.hub
            .send_room(&room_id, ServerEvent::GameUpdate { updates });
    }
}

async fn handle_resume(conn_id: ConnectionId, state: &Arc<ServerState>, token: &str) {
    let mut guard = state.core.lock().await;
    let core = &mut *guard;

    if core.sessions.identity(conn_id).is_some() {
        core.hub.send_to(
            conn_id,
            ServerEvent::Error {
                message: "already in a room".to_string(),
            },
        );
        return;
    }

    let (player_id, room_id, session_token) = match core.sessions.resume(token, conn_id) {
        Ok(session) => (
            session.player_id.clone(),
            session.room_id.clone(),
            session.token.clone(),
        ),
        Err(err) => {
            tracing::debug!(%conn_id, %err, "resume rejected");
            core.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            );
            return;
        }
    };

    core.registry
        .set_player_connection(&room_id, &player_id, true);
    core.registry
        .rebind_player_socket(&room_id, &player_id, &conn_id.to_string());

    let Some(room) = core.registry.room(&room_id) else {
        // Session outlived its room somehow; tear it down.
        core.sessions.unbind(conn_id);
        core.hub.send_to(
            conn_id,
            ServerEvent::Error {
                message: "room no longer exists".to_string(),
            },
        );
        return;
    };
    let summary = room.summary();
    let players = room.players().to_vec();

    core.hub.subscribe(conn_id, room_id.clone());
    core.hub.send_room_except(
        &room_id,
        conn_id,
        ServerEvent::PlayerReconnected {
            player_id: player_id.clone(),
        },
    );
    core.hub.send_to(
        conn_id,
        ServerEvent::RoomJoined {
            room: summary,
            players,
            session_token,
        },
    );
    tracing::info!(%conn_id, %player_id, %room_id, "player reconnected");
}

/// Tears down a dropped connection: start the grace window if it was
/// in a room, or just forget it.
pub(crate) async fn handle_disconnect(conn_id: ConnectionId, state: &Arc<ServerState>) {
    let ticket;
    let grace;
    {
        let mut guard = state.core.lock().await;
        let core = &mut *guard;

        core.hub.unregister(conn_id);

        let Some(t) = core.sessions.disconnect(conn_id) else {
            return;
        };
        core.registry
            .set_player_connection(&t.room_id, &t.player_id, false);
        core.hub.send_room(
            &t.room_id,
            ServerEvent::PlayerDisconnected {
                player_id: t.player_id.clone(),
            },
        );
        grace = core.sessions.reconnect_grace();
        ticket = t;
    }

    timers::spawn_grace_timer(Arc::clone(state), ticket, grace);
}

/// Server-assigned player ids: `p_` plus eight alphanumerics.
fn generate_player_id() -> PlayerId {
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect();
    PlayerId(format!("p_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_player_id_has_prefix_and_length() {
        let id = generate_player_id();
        assert!(id.0.starts_with("p_"));
        assert_eq!(id.0.len(), 10);
    }

    #[test]
    fn test_generate_player_id_is_unique_enough() {
        let a = generate_player_id();
        let b = generate_player_id();
        assert_ne!(a, b);
    }
}
