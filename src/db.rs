use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type Db = sqlx::SqlitePool;

pub async fn connect(url: &str) -> Result<Db, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    // An in-memory database exists per connection, so the pool must not
    // hand out more than one.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    Ok(pool)
}

async fn migrate(pool: &Db) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS chats (
    id                  TEXT PRIMARY KEY,
    member_a            TEXT NOT NULL,
    member_b            TEXT NOT NULL,
    last_message_text   TEXT,
    last_message_sender TEXT,
    last_message_at     INTEGER,
    created_at          INTEGER NOT NULL,
    updated_at          INTEGER NOT NULL,
    UNIQUE (member_a, member_b)
)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY,
    chat_id    TEXT NOT NULL REFERENCES chats (id),
    sender     TEXT NOT NULL,
    text       TEXT NOT NULL,
    created_at INTEGER NOT NULL
)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages (chat_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS chat_reads (
    chat_id      TEXT NOT NULL,
    participant  TEXT NOT NULL,
    last_read_at INTEGER NOT NULL,
    PRIMARY KEY (chat_id, participant)
)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS users (
    sub    TEXT PRIMARY KEY,
    name   TEXT NOT NULL,
    avatar TEXT
)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
