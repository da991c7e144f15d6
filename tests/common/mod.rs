#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use gharelu_chat::chat::model::{ChatDetail, ChatDto, CreatedChat};
use gharelu_chat::client::api::ChatApi;
use gharelu_chat::client::notify::{EventSink, Toast};
use gharelu_chat::client::session::SessionManager;
use gharelu_chat::config::Config;
use gharelu_chat::event::model::{Command, Notification};
use gharelu_chat::event::ConnectionId;
use gharelu_chat::message::model::MessageDto;
use gharelu_chat::state::AppState;
use gharelu_chat::user::Sub;
use gharelu_chat::{chat, client, event, message, user};

pub async fn test_state() -> AppState {
    AppState::init(&Config::default())
        .await
        .expect("failed to init test state")
}

/// Serves the full REST + WebSocket router on an ephemeral local port and
/// returns its address.
pub async fn spawn_server(state: AppState) -> std::net::SocketAddr {
    let app = axum::Router::new()
        .merge(chat::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(user::api(state.clone()))
        .merge(event::endpoints(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// Registers a fake live connection with the delivery channel and returns
/// the receiving end of its outbound queue.
pub fn connect(state: &AppState) -> (ConnectionId, mpsc::UnboundedReceiver<Notification>) {
    let id = ConnectionId::random();
    let (tx, rx) = mpsc::unbounded_channel();
    state.event_service.register(id.clone(), tx);
    (id, rx)
}

/// In-process `ChatApi` backed directly by the server services, with an
/// optional per-chat fetch delay to provoke stale-response races.
pub struct FakeApi {
    state: AppState,
    me: Sub,
    slow: StdMutex<HashMap<chat::Id, Duration>>,
}

impl FakeApi {
    pub fn new(state: &AppState, me: &str) -> Arc<Self> {
        Arc::new(Self {
            state: state.clone(),
            me: Sub::from(me),
            slow: StdMutex::new(HashMap::new()),
        })
    }

    pub fn slow_down(&self, chat_id: &chat::Id, delay: Duration) {
        self.slow
            .lock()
            .unwrap()
            .insert(chat_id.clone(), delay);
    }
}

fn map_chat_err(e: chat::Error) -> client::Error {
    match e {
        chat::Error::NotFound(_) => client::Error::NotFound,
        chat::Error::NotMember => client::Error::Forbidden,
        chat::Error::SelfChat => client::Error::Validation(e.to_string()),
        _ => client::Error::Server(500),
    }
}

fn map_message_err(e: message::Error) -> client::Error {
    match e {
        message::Error::EmptyText => client::Error::Validation(e.to_string()),
        message::Error::_Chat(e) => map_chat_err(e),
        _ => client::Error::Server(500),
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn list_chats(&self) -> client::Result<Vec<ChatDto>> {
        self.state
            .chat_service
            .find_all(&self.me)
            .await
            .map_err(map_chat_err)
    }

    async fn create_chat(&self, recipient: &Sub) -> client::Result<CreatedChat> {
        self.state
            .chat_service
            .create_or_get(&self.me, recipient)
            .await
            .map_err(map_chat_err)
    }

    async fn fetch_chat(&self, chat_id: &chat::Id) -> client::Result<ChatDetail> {
        let delay = self.slow.lock().unwrap().get(chat_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let chat = self
            .state
            .chat_service
            .find_by_id(chat_id, &self.me)
            .await
            .map_err(map_chat_err)?;
        let messages = self
            .state
            .message_service
            .find_by_chat_id(chat_id, &self.me, None)
            .await
            .map_err(map_message_err)?;

        Ok(ChatDetail { chat, messages })
    }

    async fn mark_read(&self, chat_id: &chat::Id) -> client::Result<()> {
        self.state
            .chat_service
            .mark_read(chat_id, &self.me)
            .await
            .map_err(map_chat_err)
    }

    async fn send_message(&self, chat_id: &chat::Id, text: &str) -> client::Result<MessageDto> {
        self.state
            .message_service
            .create(chat_id, &self.me, text)
            .await
            .map_err(map_message_err)
    }
}

/// Builds a session manager for `me` wired to an in-process API, returning
/// the api handle and the receiver capturing outbound socket commands.
pub fn session_for(
    state: &AppState,
    me: &str,
    sinks: Vec<Arc<dyn EventSink>>,
) -> (
    SessionManager,
    Arc<FakeApi>,
    mpsc::UnboundedReceiver<Command>,
) {
    let api = FakeApi::new(state, me);
    let (tx, rx) = mpsc::unbounded_channel();
    let session = SessionManager::new(api.clone(), tx, sinks, Sub::from(me));
    (session, api, rx)
}

/// Sink capturing every event for assertions.
#[derive(Default)]
pub struct CaptureSink {
    pub toasts: StdMutex<Vec<Toast>>,
    pub unread_totals: StdMutex<Vec<i64>>,
}

impl EventSink for CaptureSink {
    fn message_arrived(&self, toast: &Toast) {
        self.toasts.lock().unwrap().push(toast.clone());
    }

    fn unread_count_changed(&self, total: i64) {
        self.unread_totals.lock().unwrap().push(total);
    }
}

pub fn drain_commands(rx: &mut mpsc::UnboundedReceiver<Command>) -> Vec<Command> {
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    commands
}
