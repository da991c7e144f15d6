use axum::response::{IntoResponse, Response};

pub mod chat;
pub mod client;
pub mod config;
pub mod db;
pub mod event;
pub mod message;
pub mod state;
pub mod user;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error for handlers that span more than one feature module.
/// The response is delegated to the module the failure originated in.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Chat(#[from] chat::Error),
    _Message(#[from] message::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::_Chat(e) => e.into_response(),
            Self::_Message(e) => e.into_response(),
        }
    }
}
