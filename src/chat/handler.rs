use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::message::service::MessageService;
use crate::user;

use super::model::{ChatDetail, ChatDto, CreatedChat};
use super::service::ChatService;
use super::Id;

pub async fn find_all(
    Extension(sub): Extension<user::Sub>,
    State(chat_service): State<ChatService>,
) -> crate::Result<Json<Vec<ChatDto>>> {
    let chats = chat_service.find_all(&sub).await?;
    Ok(Json(chats))
}

#[derive(Deserialize)]
pub struct CreateParams {
    recipient: user::Sub,
}

pub async fn create(
    Extension(sub): Extension<user::Sub>,
    State(chat_service): State<ChatService>,
    Json(params): Json<CreateParams>,
) -> crate::Result<Json<CreatedChat>> {
    let created = chat_service.create_or_get(&sub, &params.recipient).await?;
    Ok(Json(created))
}

/// Detail plus full history. Deliberately does not mark the chat read;
/// `PUT /chats/{id}/read` is the explicit read marker.
pub async fn find_one(
    Path(id): Path<Id>,
    Extension(sub): Extension<user::Sub>,
    State(chat_service): State<ChatService>,
    State(message_service): State<MessageService>,
) -> crate::Result<Json<ChatDetail>> {
    let chat = chat_service.find_by_id(&id, &sub).await?;
    let messages = message_service.find_by_chat_id(&id, &sub, None).await?;

    Ok(Json(ChatDetail { chat, messages }))
}

pub async fn mark_read(
    Path(id): Path<Id>,
    Extension(sub): Extension<user::Sub>,
    State(chat_service): State<ChatService>,
) -> crate::Result<StatusCode> {
    chat_service.mark_read(&id, &sub).await?;
    Ok(StatusCode::NO_CONTENT)
}
