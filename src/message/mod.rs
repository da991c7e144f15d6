use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::{chat, user};

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
        .route("/chats/message", post(handler::create))
        .route_layer(axum::middleware::from_fn(user::middleware::identity))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message text is empty")]
    EmptyText,

    #[error(transparent)]
    _Chat(#[from] chat::Error),

    #[error(transparent)]
    _User(#[from] user::Error),

    #[error(transparent)]
    _Sqlx(#[from] sqlx::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::EmptyText => {
                debug!("{self}");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::_Chat(e) => return e.into_response(),
            Self::_User(e) => return e.into_response(),
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
