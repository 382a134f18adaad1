//! The broadcast hub: fans server events out to connections.
//!
//! Every connection registers an unbounded channel here; a per-connection
//! writer task drains it onto the socket. Because events are queued
//! while the core lock is held, the queue order — and therefore the
//! order every client observes — matches mutation order. Delivery to a
//! dead channel is silently dropped; the disconnect path cleans the
//! entry up moments later.
//!
//! Rooms are broadcast groups: a connection subscribes when its player
//! joins and unsubscribes when it leaves or drops.

use std::collections::{HashMap, HashSet};

use keyrace_protocol::{RoomId, ServerEvent};
use keyrace_transport::ConnectionId;
use tokio::sync::mpsc;

/// Receiving half handed to a connection's writer task.
pub(crate) type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Routes outbound events to connections and room groups.
#[derive(Debug, Default)]
pub(crate) struct BroadcastHub {
    /// Outbound queue per live connection.
    senders: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,

    /// Broadcast group per room.
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,

    /// Which group each subscribed connection belongs to.
    membership: HashMap<ConnectionId, RoomId>,
}

impl BroadcastHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the receiver its writer task
    /// drains.
    pub(crate) fn register(&mut self, conn_id: ConnectionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(conn_id, tx);
        rx
    }

    /// Removes a connection entirely: its queue and any room
    /// subscription.
    pub(crate) fn unregister(&mut self, conn_id: ConnectionId) {
        self.senders.remove(&conn_id);
        self.unsubscribe(conn_id);
    }

    /// Adds a connection to a room's broadcast group.
    pub(crate) fn subscribe(&mut self, conn_id: ConnectionId, room_id: RoomId) {
        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(conn_id);
        self.membership.insert(conn_id, room_id);
    }

    /// Removes a connection from its broadcast group, if any.
    pub(crate) fn unsubscribe(&mut self, conn_id: ConnectionId) {
        let Some(room_id) = self.membership.remove(&conn_id) else {
            return;
        };
        if let Some(members) = self.rooms.get_mut(&room_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
    }

    /// Queues an event for a single connection. Silently drops if the
    /// connection is gone.
    pub(crate) fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn_id) {
            let _ = sender.send(event);
        }
    }

    /// Queues an event for every member of a room.
    pub(crate) fn send_room(&self, room_id: &RoomId, event: ServerEvent) {
        let Some(members) = self.rooms.get(room_id) else {
            return;
        };
        for conn_id in members {
            self.send_to(*conn_id, event.clone());
        }
    }

    /// Queues an event for every room member except one — "tell the
    /// others" notifications like `player:joined`.
    pub(crate) fn send_room_except(
        &self,
        room_id: &RoomId,
        except: ConnectionId,
        event: ServerEvent,
    ) {
        let Some(members) = self.rooms.get(room_id) else {
            return;
        };
        for conn_id in members {
            if *conn_id != except {
                self.send_to(*conn_id, event.clone());
            }
        }
    }

    /// Queues an event for every connected client, in or out of rooms.
    /// The lobby listing is global, so `room:list` updates go here.
    pub(crate) fn send_all(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn rid(id: &str) -> RoomId {
        RoomId(id.into())
    }

    fn ev() -> ServerEvent {
        ServerEvent::RoomLeft
    }

    #[test]
    fn test_send_to_reaches_registered_connection() {
        let mut hub = BroadcastHub::new();
        let mut rx = hub.register(conn(1));

        hub.send_to(conn(1), ev());

        assert_eq!(rx.try_recv().unwrap(), ev());
    }

    #[test]
    fn test_send_to_unknown_connection_is_silently_dropped() {
        let hub = BroadcastHub::new();
        hub.send_to(conn(9), ev()); // must not panic
    }

    #[test]
    fn test_send_room_reaches_only_subscribers() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = hub.register(conn(1));
        let mut rx2 = hub.register(conn(2));
        let mut rx3 = hub.register(conn(3));
        hub.subscribe(conn(1), rid("R1"));
        hub.subscribe(conn(2), rid("R1"));
        hub.subscribe(conn(3), rid("R2"));

        hub.send_room(&rid("R1"), ev());

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(rx3.try_recv().is_err());
    }

    #[test]
    fn test_send_room_except_skips_the_origin() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = hub.register(conn(1));
        let mut rx2 = hub.register(conn(2));
        hub.subscribe(conn(1), rid("R1"));
        hub.subscribe(conn(2), rid("R1"));

        hub.send_room_except(&rid("R1"), conn(1), ev());

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_send_all_reaches_unsubscribed_connections() {
        let mut hub = BroadcastHub::new();
        let mut in_room = hub.register(conn(1));
        let mut in_lobby = hub.register(conn(2));
        hub.subscribe(conn(1), rid("R1"));

        hub.send_all(ev());

        assert!(in_room.try_recv().is_ok());
        assert!(in_lobby.try_recv().is_ok());
    }

    #[test]
    fn test_unsubscribe_removes_from_room_broadcasts() {
        let mut hub = BroadcastHub::new();
        let mut rx = hub.register(conn(1));
        hub.subscribe(conn(1), rid("R1"));
        hub.unsubscribe(conn(1));

        hub.send_room(&rid("R1"), ev());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unregister_drops_queue_and_subscription() {
        let mut hub = BroadcastHub::new();
        let _rx = hub.register(conn(1));
        hub.subscribe(conn(1), rid("R1"));

        hub.unregister(conn(1));

        hub.send_to(conn(1), ev()); // silently dropped
        hub.send_room(&rid("R1"), ev()); // empty group removed
    }

    #[test]
    fn test_events_drain_in_queue_order() {
        let mut hub = BroadcastHub::new();
        let mut rx = hub.register(conn(1));

        hub.send_to(conn(1), ServerEvent::RoomLeft);
        hub.send_to(
            conn(1),
            ServerEvent::Error {
                message: "second".into(),
            },
        );

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::RoomLeft);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerEvent::Error { .. }
        ));
    }
}
