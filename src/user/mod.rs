use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum::routing::put;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

mod handler;
pub mod middleware;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

/// Header carrying the verified participant identity. The authentication
/// collaborator in front of this service is responsible for its integrity;
/// the chat core trusts it as given.
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// Opaque participant identifier, as issued by the identity collaborator.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sub(pub String);

impl Display for Sub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sub {
    fn from(sub: &str) -> Self {
        Self(sub.to_owned())
    }
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/users", put(handler::upsert))
        .route_layer(axum::middleware::from_fn(middleware::identity))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing participant identity")]
    MissingIdentity,

    #[error(transparent)]
    _Sqlx(#[from] sqlx::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingIdentity => {
                debug!("{self}");
                (StatusCode::UNAUTHORIZED, self.to_string())
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
