use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::{chat, user};

use super::model::MessageDto;
use super::service::MessageService;

#[derive(Deserialize)]
pub struct CreateParams {
    chat_id: chat::Id,
    text: String,
}

pub async fn create(
    Extension(sub): Extension<user::Sub>,
    State(message_service): State<MessageService>,
    Json(params): Json<CreateParams>,
) -> crate::Result<Json<MessageDto>> {
    let message = message_service
        .create(&params.chat_id, &sub, &params.text)
        .await?;

    Ok(Json(message))
}
