use std::sync::Arc;

use axum::extract::FromRef;

use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::config::Config;
use crate::db;
use crate::event::registry::RoomRegistry;
use crate::event::service::EventService;
use crate::message::repository::MessageRepository;
use crate::message::service::MessageService;
use crate::user::repository::UserRepository;
use crate::user::service::UserService;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub chat_service: ChatService,
    pub message_service: MessageService,
    pub user_service: UserService,
    pub event_service: EventService,
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = db::connect(&config.database_url).await?;

        let chat_service = ChatService::new(ChatRepository::new(&pool));
        let user_service = UserService::new(UserRepository::new(&pool));
        let event_service = EventService::new(Arc::new(RoomRegistry::new()));
        let message_service = MessageService::new(
            MessageRepository::new(&pool),
            chat_service.clone(),
            user_service.clone(),
            event_service.clone(),
        );

        Ok(Self {
            chat_service,
            message_service,
            user_service,
            event_service,
        })
    }
}
