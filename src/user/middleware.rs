use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::user;

use super::Sub;

/// Extracts the verified participant identity set by the authentication
/// collaborator and makes it available to handlers as an extension.
pub async fn identity(mut request: Request, next: Next) -> Response {
    let sub = request
        .headers()
        .get(user::PARTICIPANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|sub| !sub.is_empty())
        .map(Sub::from);

    match sub {
        Some(sub) => {
            request.extensions_mut().insert(sub);
            next.run(request).await
        }
        None => user::Error::MissingIdentity.into_response(),
    }
}
