use std::fmt::Display;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::user;

mod context;
mod handler;
pub mod model;
pub mod registry;
pub mod service;

/// Identifier of one live socket connection. A participant may hold several
/// at once (multiple tabs or devices).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn endpoints<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .route_layer(axum::middleware::from_fn(user::middleware::identity))
        .with_state(state)
}
