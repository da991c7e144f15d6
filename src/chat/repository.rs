use sqlx::FromRow;

use crate::db::Db;
use crate::user;

use super::model::{Chat, LastMessage, Members};
use super::Id;

#[derive(FromRow)]
struct ChatRow {
    id: String,
    member_a: String,
    member_b: String,
    last_message_text: Option<String>,
    last_message_sender: Option<String>,
    last_message_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        let last_message = match (
            row.last_message_text,
            row.last_message_sender,
            row.last_message_at,
        ) {
            (Some(text), Some(sender), Some(timestamp)) => Some(LastMessage {
                text,
                sender: user::Sub(sender),
                timestamp,
            }),
            _ => None,
        };

        Self {
            id: Id(row.id),
            members: Members::new(user::Sub(row.member_a), user::Sub(row.member_b)),
            last_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_CHAT: &str = r#"
SELECT id, member_a, member_b, last_message_text, last_message_sender,
       last_message_at, created_at, updated_at
FROM chats
"#;

pub struct ChatRepository {
    pool: Db,
}

impl ChatRepository {
    pub fn new(pool: &Db) -> Self {
        Self { pool: pool.clone() }
    }
}

impl ChatRepository {
    /// Inserts a new chat. The unique constraint on the canonical member
    /// pair turns a concurrent duplicate insert into `NotCreated`, which
    /// the service reconciles by re-fetching.
    pub async fn insert(&self, chat: &Chat) -> super::Result<()> {
        sqlx::query(
            r#"
INSERT INTO chats (id, member_a, member_b, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chat.id.0)
        .bind(&chat.members.first.0)
        .bind(&chat.members.second.0)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => super::Error::NotCreated,
            _ => e.into(),
        })?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &Id) -> super::Result<Chat> {
        let query = format!("{SELECT_CHAT} WHERE id = ?");

        sqlx::query_as::<_, ChatRow>(&query)
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(Chat::from)
            .ok_or(super::Error::NotFound(Some(id.to_owned())))
    }

    pub async fn find_by_members(&self, members: &Members) -> super::Result<Option<Chat>> {
        let query = format!("{SELECT_CHAT} WHERE member_a = ? AND member_b = ?");

        let chat = sqlx::query_as::<_, ChatRow>(&query)
            .bind(&members.first.0)
            .bind(&members.second.0)
            .fetch_optional(&self.pool)
            .await?
            .map(Chat::from);

        Ok(chat)
    }

    pub async fn find_by_participant(&self, sub: &user::Sub) -> super::Result<Vec<Chat>> {
        let query =
            format!("{SELECT_CHAT} WHERE member_a = ? OR member_b = ? ORDER BY updated_at DESC");

        let chats = sqlx::query_as::<_, ChatRow>(&query)
            .bind(&sub.0)
            .bind(&sub.0)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Chat::from)
            .collect();

        Ok(chats)
    }

    pub async fn update_last_message(
        &self,
        id: &Id,
        last_message: &LastMessage,
    ) -> super::Result<()> {
        sqlx::query(
            r#"
UPDATE chats
SET last_message_text = ?, last_message_sender = ?, last_message_at = ?, updated_at = ?
WHERE id = ?
            "#,
        )
        .bind(&last_message.text)
        .bind(&last_message.sender.0)
        .bind(last_message.timestamp)
        .bind(last_message.timestamp)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_read(&self, id: &Id, participant: &user::Sub, at: i64) -> super::Result<()> {
        sqlx::query(
            r#"
INSERT INTO chat_reads (chat_id, participant, last_read_at) VALUES (?, ?, ?)
ON CONFLICT (chat_id, participant) DO UPDATE SET last_read_at = excluded.last_read_at
            "#,
        )
        .bind(&id.0)
        .bind(&participant.0)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Messages from the counterpart created after the participant's last
    /// read marker. A participant's own sends never count against them.
    pub async fn unread_count(&self, id: &Id, participant: &user::Sub) -> super::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
SELECT COUNT(*)
FROM messages
WHERE chat_id = ?1
  AND sender != ?2
  AND created_at > COALESCE(
      (SELECT last_read_at FROM chat_reads WHERE chat_id = ?1 AND participant = ?2),
      0
  )
            "#,
        )
        .bind(&id.0)
        .bind(&participant.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
