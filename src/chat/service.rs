use std::sync::Arc;

use log::debug;

use crate::user;

use super::model::{Chat, ChatDto, CreatedChat, LastMessage, Members};
use super::repository::ChatRepository;
use super::{Error, Id, Result};

#[derive(Clone)]
pub struct ChatService {
    repository: Arc<ChatRepository>,
}

impl ChatService {
    pub fn new(repository: ChatRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

impl ChatService {
    /// Idempotent first-contact: the existing chat for the unordered pair
    /// is returned when there is one. A concurrent duplicate insert loses
    /// against the unique member-pair constraint and reconciles by
    /// re-fetching the winner's row.
    pub async fn create_or_get(&self, me: &user::Sub, other: &user::Sub) -> Result<CreatedChat> {
        if me == other {
            return Err(Error::SelfChat);
        }

        let members = Members::new(me.clone(), other.clone());

        if let Some(chat) = self.repository.find_by_members(&members).await? {
            return self.created_dto(chat, me, true).await;
        }

        let chat = Chat::new(members.clone());
        match self.repository.insert(&chat).await {
            Ok(()) => self.created_dto(chat, me, false).await,
            Err(Error::NotCreated) => {
                debug!("lost chat creation race for {members:?}, reusing existing");
                let chat = self
                    .repository
                    .find_by_members(&members)
                    .await?
                    .ok_or(Error::NotCreated)?;
                self.created_dto(chat, me, true).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_all(&self, me: &user::Sub) -> Result<Vec<ChatDto>> {
        let chats = self.repository.find_by_participant(me).await?;

        let mut dtos = Vec::with_capacity(chats.len());
        for chat in chats {
            let unread = self.repository.unread_count(&chat.id, me).await?;
            dtos.push(ChatDto::from_chat(chat, me, unread));
        }

        Ok(dtos)
    }

    pub async fn find_by_id(&self, id: &Id, me: &user::Sub) -> Result<ChatDto> {
        let chat = self.check_member(id, me).await?;
        let unread = self.repository.unread_count(id, me).await?;

        Ok(ChatDto::from_chat(chat, me, unread))
    }

    pub async fn mark_read(&self, id: &Id, me: &user::Sub) -> Result<()> {
        self.check_member(id, me).await?;

        let now = chrono::Utc::now().timestamp_millis();
        self.repository.mark_read(id, me, now).await
    }

    /// Membership gate shared with the message module.
    pub async fn check_member(&self, id: &Id, sub: &user::Sub) -> Result<Chat> {
        let chat = self.repository.find_by_id(id).await?;

        if !chat.members.contains(sub) {
            return Err(Error::NotMember);
        }

        Ok(chat)
    }

    pub async fn update_last_message(&self, id: &Id, last_message: &LastMessage) -> Result<()> {
        self.repository.update_last_message(id, last_message).await
    }
}

impl ChatService {
    async fn created_dto(
        &self,
        chat: Chat,
        me: &user::Sub,
        already_exists: bool,
    ) -> Result<CreatedChat> {
        let unread = self.repository.unread_count(&chat.id, me).await?;

        Ok(CreatedChat {
            chat: ChatDto::from_chat(chat, me, unread),
            already_exists,
        })
    }
}
