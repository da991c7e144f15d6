use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::user;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Id(pub String);

impl Id {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/chats", get(handler::find_all))
        .route("/chats", post(handler::create))
        .route("/chats/{id}", get(handler::find_one))
        .route("/chats/{id}/read", put(handler::mark_read))
        .route_layer(axum::middleware::from_fn(user::middleware::identity))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat not found: {0:?}")]
    NotFound(Option<Id>),
    #[error("user is not a member of the chat")]
    NotMember,
    #[error("cannot open a chat with yourself")]
    SelfChat,
    #[error("could not create chat")]
    NotCreated,

    #[error(transparent)]
    _Sqlx(#[from] sqlx::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(_) => {
                debug!("{self}");
                (StatusCode::NOT_FOUND, self.to_string())
            }
            // Should not happen for well-behaved clients: either a stale
            // cache or a spoofed identifier.
            Self::NotMember => {
                warn!("{self}");
                (StatusCode::FORBIDDEN, self.to_string())
            }
            Self::SelfChat => {
                debug!("{self}");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::NotCreated => {
                error!("{self}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::_Sqlx(_) => {
                error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        (status, message).into_response()
    }
}
