use serde::{Deserialize, Serialize};

use crate::message::model::MessageDto;
use crate::user;

use super::Id;

/// The unordered participant pair, stored in canonical order so the same
/// two participants always map to the same row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Members {
    pub first: user::Sub,
    pub second: user::Sub,
}

impl Members {
    pub fn new(a: user::Sub, b: user::Sub) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn contains(&self, sub: &user::Sub) -> bool {
        self.first == *sub || self.second == *sub
    }

    pub fn other(&self, sub: &user::Sub) -> &user::Sub {
        if self.first == *sub {
            &self.second
        } else {
            &self.first
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LastMessage {
    pub text: String,
    pub sender: user::Sub,
    pub timestamp: i64,
}

#[derive(Clone, Debug)]
pub struct Chat {
    pub id: Id,
    pub members: Members,
    pub last_message: Option<LastMessage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    pub fn new(members: Members) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: Id::random(),
            members,
            last_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Chat as seen by one participant: the counterpart is surfaced as the
/// recipient and the unread count is theirs.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatDto {
    pub id: Id,
    pub recipient: user::Sub,
    pub last_message: Option<LastMessage>,
    pub unread: i64,
    pub updated_at: i64,
}

impl ChatDto {
    pub fn from_chat(chat: Chat, me: &user::Sub, unread: i64) -> Self {
        let recipient = chat.members.other(me).clone();
        Self {
            id: chat.id,
            recipient,
            last_message: chat.last_message,
            unread,
            updated_at: chat.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatedChat {
    pub chat: ChatDto,
    pub already_exists: bool,
}

/// `GET /chats/{id}` payload: detail plus full ascending history. Fetching
/// it does not mark the chat read; that is a separate explicit call.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatDetail {
    pub chat: ChatDto,
    pub messages: Vec<MessageDto>,
}
