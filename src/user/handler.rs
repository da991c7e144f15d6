use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::model::User;
use super::service::UserService;
use super::Sub;

/// Seeds or refreshes the caller's directory record. Participants may only
/// write their own entry.
pub async fn upsert(
    Extension(sub): Extension<Sub>,
    State(user_service): State<UserService>,
    Json(mut user): Json<User>,
) -> super::Result<StatusCode> {
    user.sub = sub.0;
    user_service.upsert(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
