use std::collections::HashSet;

use dashmap::DashMap;
use log::debug;
use tokio::sync::mpsc;

use crate::chat;

use super::model::Notification;
use super::ConnectionId;

/// Transient connection-to-room mapping, rebuilt from zero on restart.
/// Clients are expected to re-join their rooms after reconnecting.
#[derive(Default)]
pub struct RoomRegistry {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Notification>>,
    rooms: DashMap<chat::Id, HashSet<ConnectionId>>,
    joined: DashMap<ConnectionId, HashSet<chat::Id>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomRegistry {
    pub fn register(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Notification>) {
        debug!("registering connection {connection_id}");
        self.connections.insert(connection_id, tx);
    }

    /// Implicitly leaves every room the connection had joined.
    pub fn deregister(&self, connection_id: &ConnectionId) {
        debug!("deregistering connection {connection_id}");

        if let Some((_, rooms)) = self.joined.remove(connection_id) {
            for chat_id in rooms {
                self.remove_from_room(connection_id, &chat_id);
            }
        }

        self.connections.remove(connection_id);
    }

    pub fn join(&self, connection_id: &ConnectionId, chat_id: &chat::Id) {
        if !self.connections.contains_key(connection_id) {
            return;
        }

        self.rooms
            .entry(chat_id.clone())
            .or_default()
            .insert(connection_id.clone());
        self.joined
            .entry(connection_id.clone())
            .or_default()
            .insert(chat_id.clone());
    }

    /// Leaving a room that was never joined is a no-op.
    pub fn leave(&self, connection_id: &ConnectionId, chat_id: &chat::Id) {
        self.remove_from_room(connection_id, chat_id);

        if let Some(mut rooms) = self.joined.get_mut(connection_id) {
            rooms.remove(chat_id);
        }
    }

    pub fn members_of(&self, chat_id: &chat::Id) -> Vec<ConnectionId> {
        self.rooms
            .get(chat_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sender_of(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<mpsc::UnboundedSender<Notification>> {
        self.connections
            .get(connection_id)
            .map(|tx| tx.value().clone())
    }
}

impl RoomRegistry {
    fn remove_from_room(&self, connection_id: &ConnectionId, chat_id: &chat::Id) {
        if let Some(mut members) = self.rooms.get_mut(chat_id) {
            members.remove(connection_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(chat_id, |_, members| members.is_empty());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(registry: &RoomRegistry) -> (ConnectionId, mpsc::UnboundedReceiver<Notification>) {
        let id = ConnectionId::random();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(id.clone(), tx);
        (id, rx)
    }

    #[test]
    fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        let (id, _rx) = conn(&registry);
        let room = chat::Id::random();

        registry.join(&id, &room);
        registry.join(&id, &room);

        assert_eq!(registry.members_of(&room), vec![id]);
    }

    #[test]
    fn leave_of_unjoined_room_is_noop() {
        let registry = RoomRegistry::new();
        let (id, _rx) = conn(&registry);

        registry.leave(&id, &chat::Id::random());

        assert!(registry.members_of(&chat::Id::random()).is_empty());
    }

    #[test]
    fn deregister_leaves_all_rooms() {
        let registry = RoomRegistry::new();
        let (id, _rx) = conn(&registry);
        let (other, _other_rx) = conn(&registry);
        let room_a = chat::Id::random();
        let room_b = chat::Id::random();

        registry.join(&id, &room_a);
        registry.join(&id, &room_b);
        registry.join(&other, &room_a);

        registry.deregister(&id);

        assert_eq!(registry.members_of(&room_a), vec![other]);
        assert!(registry.members_of(&room_b).is_empty());
        assert!(registry.sender_of(&id).is_none());
    }

    #[test]
    fn join_of_unknown_connection_is_ignored() {
        let registry = RoomRegistry::new();
        let room = chat::Id::random();

        registry.join(&ConnectionId::random(), &room);

        assert!(registry.members_of(&room).is_empty());
    }
}
