//! One-shot timers: the race duration clock and the disconnect grace
//! window.
//!
//! Timers are never cancelled — they always fire, re-check the world
//! under the lock, and no-op if they were superseded. The duration
//! timer carries the round it was armed for; the grace timer carries a
//! [`DisconnectTicket`] whose epoch the session manager validates.

use std::sync::Arc;
use std::time::Duration;

use keyrace_protocol::{RoomId, RoomStatus, ServerEvent};
use keyrace_session::DisconnectTicket;

use crate::server::ServerState;

/// Arms the race clock for one round. When it fires, the room is moved
/// to `finished` and the final standings are broadcast — unless the
/// round counter moved on, in which case this timer belongs to a past
/// round and does nothing.
pub(crate) fn spawn_game_timer(
    state: Arc<ServerState>,
    room_id: RoomId,
    round: u64,
    duration_secs: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(duration_secs)).await;

        let mut guard = state.core.lock().await;
        let core = &mut *guard;

        let current = core
            .registry
            .room(&room_id)
            .map(|room| (room.status, room.round));
        match current {
            Some((RoomStatus::Playing, r)) if r == round => {}
            _ => {
                tracing::debug!(%room_id, round, "stale duration timer, ignoring");
                return;
            }
        }

        let Some(room) = core.registry.end_game(&room_id) else {
            return;
        };
        let players = room.players().to_vec();
        let duration = room.game_config.duration;
        core.hub
            .send_room(&room_id, ServerEvent::GameEnd { players, duration });
    });
}

/// Arms the disconnect reaper for one grace window. When it fires, the
/// session manager decides whether eviction still applies; on a stale
/// ticket (the player resumed, or dropped again later) nothing happens.
pub(crate) fn spawn_grace_timer(
    state: Arc<ServerState>,
    ticket: DisconnectTicket,
    grace: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;

        let mut guard = state.core.lock().await;
        let core = &mut *guard;

        let Some((player_id, room_id)) = core.sessions.evict(&ticket) else {
            return;
        };

        core.registry.leave_room(&room_id, &player_id);
        core.hub
            .send_room(&room_id, ServerEvent::PlayerLeft { player_id });

        let rooms = core.registry.waiting_rooms();
        core.hub.send_all(ServerEvent::RoomList { rooms });
    });
}
