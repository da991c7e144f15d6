use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::chat::model::{ChatDetail, ChatDto, CreatedChat};
use crate::message::model::MessageDto;
use crate::{chat, user};

use super::{Error, Result};

/// REST seam the session manager is written against. Tests substitute an
/// in-process implementation; production uses [`HttpChatApi`].
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn list_chats(&self) -> Result<Vec<ChatDto>>;

    async fn create_chat(&self, recipient: &user::Sub) -> Result<CreatedChat>;

    async fn fetch_chat(&self, chat_id: &chat::Id) -> Result<ChatDetail>;

    async fn mark_read(&self, chat_id: &chat::Id) -> Result<()>;

    async fn send_message(&self, chat_id: &chat::Id, text: &str) -> Result<MessageDto>;
}

pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
    me: user::Sub,
}

impl HttpChatApi {
    pub fn new(base_url: &str, me: user::Sub) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            me,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn expect_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound,
            StatusCode::FORBIDDEN => Error::Forbidden,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let message = response.text().await.unwrap_or_default();
                Error::Validation(message)
            }
            _ => Error::Server(status.as_u16()),
        })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_chats(&self) -> Result<Vec<ChatDto>> {
        let response = self
            .http
            .get(self.url("/chats"))
            .header(user::PARTICIPANT_HEADER, &self.me.0)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn create_chat(&self, recipient: &user::Sub) -> Result<CreatedChat> {
        let response = self
            .http
            .post(self.url("/chats"))
            .header(user::PARTICIPANT_HEADER, &self.me.0)
            .json(&json!({ "recipient": recipient }))
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn fetch_chat(&self, chat_id: &chat::Id) -> Result<ChatDetail> {
        let response = self
            .http
            .get(self.url(&format!("/chats/{chat_id}")))
            .header(user::PARTICIPANT_HEADER, &self.me.0)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn mark_read(&self, chat_id: &chat::Id) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("/chats/{chat_id}/read")))
            .header(user::PARTICIPANT_HEADER, &self.me.0)
            .send()
            .await?;

        Self::expect_ok(response).await.map(|_| ())
    }

    async fn send_message(&self, chat_id: &chat::Id, text: &str) -> Result<MessageDto> {
        let response = self
            .http
            .post(self.url("/chats/message"))
            .header(user::PARTICIPANT_HEADER, &self.me.0)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        Self::expect_json(response).await
    }
}
