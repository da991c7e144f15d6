use std::sync::Arc;

use tokio::sync::Notify;

use crate::user;

use super::ConnectionId;

/// Per-socket context shared between the read and write tasks.
#[derive(Clone)]
pub struct Ws {
    pub connection_id: ConnectionId,
    pub logged_sub: user::Sub,
    pub close: Arc<Notify>,
}

impl Ws {
    pub fn new(connection_id: ConnectionId, logged_sub: user::Sub) -> Self {
        Self {
            connection_id,
            logged_sub,
            close: Arc::new(Notify::new()),
        }
    }
}
