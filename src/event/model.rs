use serde::{Deserialize, Serialize};

use crate::message::model::MessageDto;
use crate::{chat, user};

/// Client-to-server socket frames.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    JoinChat { chat_id: chat::Id },
    LeaveChat { chat_id: chat::Id },
    SendMessage { chat_id: chat::Id, text: String },
    Typing { chat_id: chat::Id },
    StopTyping { chat_id: chat::Id },
}

/// Server-to-client socket frames. Delivery is best-effort; a member that
/// is disconnected at broadcast time simply misses the event and recovers
/// by re-fetching history on its next room join.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    MessageReceived {
        message: MessageDto,
    },
    TypingStarted {
        chat_id: chat::Id,
        participant: user::Sub,
    },
    TypingStopped {
        chat_id: chat::Id,
        participant: user::Sub,
    },
}
