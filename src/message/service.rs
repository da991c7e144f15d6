use std::sync::Arc;

use log::warn;

use crate::chat::model::LastMessage;
use crate::chat::service::ChatService;
use crate::event::model::Notification;
use crate::event::service::EventService;
use crate::user::service::UserService;
use crate::{chat, user};

use super::model::{Message, MessageDto};
use super::repository::MessageRepository;
use super::{Error, Result};

#[derive(Clone)]
pub struct MessageService {
    repository: Arc<MessageRepository>,
    chat_service: ChatService,
    user_service: UserService,
    event_service: EventService,
}

impl MessageService {
    pub fn new(
        repository: MessageRepository,
        chat_service: ChatService,
        user_service: UserService,
        event_service: EventService,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            chat_service,
            user_service,
            event_service,
        }
    }
}

impl MessageService {
    /// Persists the message, refreshes the chat's last-message summary and
    /// echoes the result to the chat room. The broadcast is best-effort:
    /// disconnected members recover by re-fetching history on their next
    /// room join.
    pub async fn create(
        &self,
        chat_id: &chat::Id,
        sender: &user::Sub,
        text: &str,
    ) -> Result<MessageDto> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyText);
        }

        self.chat_service.check_member(chat_id, sender).await?;

        let message = Message::new(chat_id.clone(), sender.clone(), text);
        self.repository.insert(&message).await?;

        let last_message = LastMessage {
            text: message.text.clone(),
            sender: message.sender.clone(),
            timestamp: message.created_at,
        };
        self.chat_service
            .update_last_message(chat_id, &last_message)
            .await?;

        let sender_info = self.user_service.find_display_info(sender).await?;
        let dto = message.into_dto(sender_info);

        // The sender's own session relies on this echo instead of appending
        // locally, so it must not be excluded from the broadcast.
        self.event_service.broadcast(
            chat_id,
            Notification::MessageReceived {
                message: dto.clone(),
            },
            None,
        );

        Ok(dto)
    }

    pub async fn find_by_chat_id(
        &self,
        chat_id: &chat::Id,
        requester: &user::Sub,
        limit: Option<usize>,
    ) -> Result<Vec<MessageDto>> {
        self.chat_service.check_member(chat_id, requester).await?;

        let messages = match limit {
            Some(limit) => {
                self.repository
                    .find_by_chat_id_limited(chat_id, limit)
                    .await?
            }
            None => self.repository.find_by_chat_id(chat_id).await?,
        };

        let mut dtos = Vec::with_capacity(messages.len());
        for message in messages {
            let sender_info = match self.user_service.find_display_info(&message.sender).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("falling back to raw sender info: {e}");
                    user::model::DisplayInfo::raw(&message.sender)
                }
            };
            dtos.push(message.into_dto(sender_info));
        }

        Ok(dtos)
    }
}
