use serde::{Deserialize, Serialize};

use crate::user::model::DisplayInfo;
use crate::{chat, user};

use super::Id;

/// A single immutable text entry belonging to a chat.
#[derive(Clone, Debug)]
pub struct Message {
    pub id: Id,
    pub chat_id: chat::Id,
    pub sender: user::Sub,
    pub text: String,
    pub created_at: i64,
}

impl Message {
    pub fn new(chat_id: chat::Id, sender: user::Sub, text: &str) -> Self {
        Self {
            id: Id::random(),
            chat_id,
            sender,
            text: text.to_owned(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn into_dto(self, sender_info: DisplayInfo) -> MessageDto {
        MessageDto {
            id: self.id,
            chat_id: self.chat_id,
            sender: self.sender,
            sender_name: sender_info.name,
            sender_avatar: sender_info.avatar,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// Message enriched with sender display info for clients.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageDto {
    pub id: Id,
    pub chat_id: chat::Id,
    pub sender: user::Sub,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub text: String,
    pub created_at: i64,
}
