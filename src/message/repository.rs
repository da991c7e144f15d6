use sqlx::FromRow;

use crate::db::Db;
use crate::{chat, user};

use super::model::Message;
use super::Id;

#[derive(FromRow)]
struct MessageRow {
    id: String,
    chat_id: String,
    sender: String,
    text: String,
    created_at: i64,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: Id(row.id),
            chat_id: chat::Id(row.chat_id),
            sender: user::Sub(row.sender),
            text: row.text,
            created_at: row.created_at,
        }
    }
}

pub struct MessageRepository {
    pool: Db,
}

impl MessageRepository {
    pub fn new(pool: &Db) -> Self {
        Self { pool: pool.clone() }
    }
}

impl MessageRepository {
    pub async fn insert(&self, message: &Message) -> super::Result<()> {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id.0)
        .bind(&message.chat_id.0)
        .bind(&message.sender.0)
        .bind(&message.text)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Chronological ascending; rowid breaks same-millisecond ties so a
    /// single sender's sequential sends keep their send order. Cross-sender
    /// order within one millisecond stays unspecified.
    pub async fn find_by_chat_id(&self, chat_id: &chat::Id) -> super::Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, MessageRow>(
            r#"
SELECT id, chat_id, sender, text, created_at
FROM messages
WHERE chat_id = ?
ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(&chat_id.0)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Message::from)
        .collect();

        Ok(messages)
    }

    /// The newest `limit` messages, still returned ascending.
    pub async fn find_by_chat_id_limited(
        &self,
        chat_id: &chat::Id,
        limit: usize,
    ) -> super::Result<Vec<Message>> {
        let mut messages: Vec<Message> = sqlx::query_as::<_, MessageRow>(
            r#"
SELECT id, chat_id, sender, text, created_at
FROM messages
WHERE chat_id = ?
ORDER BY created_at DESC, rowid DESC
LIMIT ?
            "#,
        )
        .bind(&chat_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Message::from)
        .collect();

        messages.reverse();

        Ok(messages)
    }
}
