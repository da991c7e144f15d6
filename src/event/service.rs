use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc;

use crate::chat;

use super::model::Notification;
use super::registry::RoomRegistry;
use super::ConnectionId;

/// Delivery channel over the room registry. Sends are best-effort and never
/// fail the caller: an event for a closed connection is dropped silently.
#[derive(Clone)]
pub struct EventService {
    registry: Arc<RoomRegistry>,
}

impl EventService {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}

impl EventService {
    pub fn register(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Notification>) {
        self.registry.register(connection_id, tx);
    }

    pub fn deregister(&self, connection_id: &ConnectionId) {
        self.registry.deregister(connection_id);
    }

    pub fn join(&self, connection_id: &ConnectionId, chat_id: &chat::Id) {
        self.registry.join(connection_id, chat_id);
    }

    pub fn leave(&self, connection_id: &ConnectionId, chat_id: &chat::Id) {
        self.registry.leave(connection_id, chat_id);
    }

    /// Returns false when the event was dropped for a closed connection.
    pub fn send(&self, connection_id: &ConnectionId, notification: Notification) -> bool {
        match self.registry.sender_of(connection_id) {
            Some(tx) => tx.send(notification).is_ok(),
            None => false,
        }
    }

    pub fn broadcast(
        &self,
        chat_id: &chat::Id,
        notification: Notification,
        exclude: Option<&ConnectionId>,
    ) {
        for member in self.registry.members_of(chat_id) {
            if Some(&member) == exclude {
                continue;
            }

            if !self.send(&member, notification.clone()) {
                debug!("dropped event for closed connection {member}");
            }
        }
    }
}
