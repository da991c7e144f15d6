//! Embeddable client for the chat service: a REST API seam, a socket
//! connector and the session/notification state the UI renders from.

pub mod api;
pub mod notify;
pub mod session;
pub mod socket;

pub type Result<T> = std::result::Result<T, Error>;

/// Client-side error taxonomy. `Validation` failures are raised locally
/// before anything touches the network; transport failures are fatal only
/// to the current session, never to the application.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("chat not found")]
    NotFound,
    #[error("access denied")]
    Forbidden,
    #[error("server error: {0}")]
    Server(u16),

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("socket failure: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}
