use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::chat::model::{ChatDto, LastMessage};
use crate::event::model::{Command, Notification};
use crate::message::model::MessageDto;
use crate::{chat, user};

use super::api::ChatApi;
use super::notify::{ChatPreview, EventSink, Toast};
use super::Result;

/// Quiet window after the last keystroke before `stop_typing` is emitted
/// automatically.
pub const TYPING_QUIET_WINDOW: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
}

struct SessionInner {
    state: SessionState,
    active: Option<chat::Id>,
    /// Bumped on every `open_chat`; a fetch that resolves under an older
    /// generation is stale and its result is discarded.
    generation: u64,
    messages: Vec<MessageDto>,
    chats: Vec<ChatDto>,
    unread: HashMap<chat::Id, i64>,
    peer_typing: bool,
    typing: bool,
    quiet_timer: Option<JoinHandle<()>>,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            active: None,
            generation: 0,
            messages: Vec::new(),
            chats: Vec::new(),
            unread: HashMap::new(),
            peer_typing: false,
            typing: false,
            quiet_timer: None,
        }
    }

    fn total_unread(&self) -> i64 {
        self.unread.values().sum()
    }
}

/// Client-side orchestration of one participant's chat UI state: the open
/// chat, its message list, unread counters and typing status.
#[derive(Clone)]
pub struct SessionManager {
    api: Arc<dyn ChatApi>,
    commands: mpsc::UnboundedSender<Command>,
    sinks: Arc<Vec<Arc<dyn EventSink>>>,
    me: user::Sub,
    inner: Arc<Mutex<SessionInner>>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn ChatApi>,
        commands: mpsc::UnboundedSender<Command>,
        sinks: Vec<Arc<dyn EventSink>>,
        me: user::Sub,
    ) -> Self {
        Self {
            api,
            commands,
            sinks: Arc::new(sinks),
            me,
            inner: Arc::new(Mutex::new(SessionInner::new())),
        }
    }

    /// Spawns a task that feeds pushed notifications into this session.
    pub fn pump(&self, mut notifications: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                session.handle_notification(notification).await;
            }
        })
    }
}

impl SessionManager {
    pub async fn load_chats(&self) -> Result<Vec<ChatDto>> {
        let chats = self.api.list_chats().await?;

        let total = {
            let mut inner = self.inner.lock().await;
            inner.unread = chats
                .iter()
                .map(|chat| (chat.id.clone(), chat.unread))
                .collect();
            inner.chats = chats.clone();
            inner.total_unread()
        };
        self.emit_unread(total);

        Ok(chats)
    }

    /// Leaves the previous room, fetches history, joins the new room and
    /// marks the chat read. A stale fetch resolving after a newer
    /// `open_chat` never overwrites the newer chat's view.
    pub async fn open_chat(&self, chat_id: &chat::Id) -> Result<()> {
        let generation = {
            let mut inner = self.inner.lock().await;
            if let Some(timer) = inner.quiet_timer.take() {
                timer.abort();
            }
            if let Some(previous) = inner.active.take() {
                // A typing burst never outlives the chat it started in.
                if inner.typing {
                    inner.typing = false;
                    let _ = self.commands.send(Command::StopTyping {
                        chat_id: previous.clone(),
                    });
                }
                let _ = self.commands.send(Command::LeaveChat { chat_id: previous });
            }
            inner.generation += 1;
            inner.active = Some(chat_id.clone());
            inner.state = SessionState::Loading;
            inner.messages.clear();
            inner.peer_typing = false;
            inner.generation
        };

        let detail = match self.api.fetch_chat(chat_id).await {
            Ok(detail) => detail,
            Err(e) => {
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.state = SessionState::Idle;
                    inner.active = None;
                }
                return Err(e);
            }
        };

        let total = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                debug!("discarding stale history for chat {chat_id}");
                return Ok(());
            }

            inner.messages = detail.messages;
            inner.unread.insert(chat_id.clone(), 0);
            inner.state = SessionState::Ready;
            let _ = self.commands.send(Command::JoinChat {
                chat_id: chat_id.clone(),
            });
            inner.total_unread()
        };
        self.emit_unread(total);

        // Read-marking is best-effort and only issued once the chat has
        // actually become the active one, so a fetch abandoned for a newer
        // `open_chat` never marks its chat read. A failure leaves the
        // server-side counter stale until the next open, it does not fail
        // the session.
        if let Err(e) = self.api.mark_read(chat_id).await {
            warn!("failed to mark chat {chat_id} read: {e}");
        }

        Ok(())
    }

    pub async fn close_chat(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(timer) = inner.quiet_timer.take() {
            timer.abort();
        }
        if let Some(previous) = inner.active.take() {
            if inner.typing {
                inner.typing = false;
                let _ = self.commands.send(Command::StopTyping {
                    chat_id: previous.clone(),
                });
            }
            let _ = self.commands.send(Command::LeaveChat { chat_id: previous });
        }
        inner.state = SessionState::Idle;
        inner.messages.clear();
        inner.peer_typing = false;
    }

    /// Send-then-await-broadcast: the message is not appended locally, the
    /// authoritative copy arrives via the `message_received` echo. Blank
    /// text and no-active-chat are quiet no-ops; a failed send propagates
    /// so the caller keeps the input text for resubmission.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let chat_id = {
            let inner = self.inner.lock().await;
            match (&inner.state, &inner.active) {
                (SessionState::Ready, Some(chat_id)) => chat_id.clone(),
                _ => return Ok(()),
            }
        };

        self.api.send_message(&chat_id, text).await?;

        Ok(())
    }

    pub async fn handle_notification(&self, notification: Notification) {
        match notification {
            Notification::MessageReceived { message } => self.on_message(message).await,
            Notification::TypingStarted { chat_id, .. } => self.set_peer_typing(&chat_id, true).await,
            Notification::TypingStopped { chat_id, .. } => {
                self.set_peer_typing(&chat_id, false).await
            }
        }
    }

    /// Emits `typing` once per burst and (re)arms the quiet-window timer;
    /// `set_typing(false)` stops the burst immediately.
    pub async fn set_typing(&self, typing: bool) {
        let mut inner = self.inner.lock().await;
        let Some(chat_id) = inner.active.clone() else {
            return;
        };

        if let Some(timer) = inner.quiet_timer.take() {
            timer.abort();
        }

        if typing {
            if !inner.typing {
                inner.typing = true;
                let _ = self.commands.send(Command::Typing {
                    chat_id: chat_id.clone(),
                });
            }

            let commands = self.commands.clone();
            let session = Arc::clone(&self.inner);
            inner.quiet_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(TYPING_QUIET_WINDOW).await;
                let mut inner = session.lock().await;
                if inner.typing {
                    inner.typing = false;
                    let _ = commands.send(Command::StopTyping { chat_id });
                }
            }));
        } else if inner.typing {
            inner.typing = false;
            let _ = self.commands.send(Command::StopTyping { chat_id });
        }
    }

    /// After a reconnect the registry has forgotten this client: re-fetch
    /// the chat list, re-join the active room and recover missed history.
    pub async fn resync(&self) -> Result<()> {
        self.load_chats().await?;

        let active = self.inner.lock().await.active.clone();
        if let Some(chat_id) = active {
            let detail = self.api.fetch_chat(&chat_id).await?;

            let mut inner = self.inner.lock().await;
            if inner.active.as_ref() == Some(&chat_id) {
                inner.messages = detail.messages;
                let _ = self.commands.send(Command::JoinChat { chat_id });
            }
        }

        Ok(())
    }
}

impl SessionManager {
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn active_chat(&self) -> Option<chat::Id> {
        self.inner.lock().await.active.clone()
    }

    pub async fn messages(&self) -> Vec<MessageDto> {
        self.inner.lock().await.messages.clone()
    }

    pub async fn peer_typing(&self) -> bool {
        self.inner.lock().await.peer_typing
    }

    pub async fn total_unread(&self) -> i64 {
        self.inner.lock().await.total_unread()
    }

    pub async fn unread_for(&self, chat_id: &chat::Id) -> i64 {
        self.inner
            .lock()
            .await
            .unread
            .get(chat_id)
            .copied()
            .unwrap_or(0)
    }

    /// Recency-sorted preview, capped to the top `limit` chats.
    pub async fn preview(&self, limit: usize) -> Vec<ChatPreview> {
        let inner = self.inner.lock().await;

        let mut chats: Vec<&ChatDto> = inner.chats.iter().collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        chats
            .into_iter()
            .take(limit)
            .map(|chat| ChatPreview {
                chat_id: chat.id.clone(),
                recipient: chat.recipient.clone(),
                last_message: chat.last_message.clone(),
                unread: inner.unread.get(&chat.id).copied().unwrap_or(chat.unread),
            })
            .collect()
    }
}

impl SessionManager {
    async fn on_message(&self, message: MessageDto) {
        let (total, toast) = {
            let mut inner = self.inner.lock().await;

            // Keep the preview list current regardless of which chat the
            // message lands in.
            if let Some(chat) = inner.chats.iter_mut().find(|c| c.id == message.chat_id) {
                chat.last_message = Some(LastMessage {
                    text: message.text.clone(),
                    sender: message.sender.clone(),
                    timestamp: message.created_at,
                });
                chat.updated_at = message.created_at;
            }

            let open = inner.active.as_ref() == Some(&message.chat_id);
            if open {
                // Appended in arrival order; this includes the echo of our
                // own sends.
                inner.messages.push(message);
                (None, None)
            } else {
                if message.sender != self.me {
                    *inner.unread.entry(message.chat_id.clone()).or_insert(0) += 1;
                }

                let toast = inner.active.is_none().then(|| Toast {
                    chat_id: message.chat_id.clone(),
                    sender: message.sender.clone(),
                    sender_name: message.sender_name.clone(),
                    text: message.text.clone(),
                });

                (Some(inner.total_unread()), toast)
            }
        };

        if let Some(total) = total {
            self.emit_unread(total);
        }
        if let Some(toast) = toast {
            for sink in self.sinks.iter() {
                sink.message_arrived(&toast);
            }
        }
    }

    async fn set_peer_typing(&self, chat_id: &chat::Id, typing: bool) {
        let mut inner = self.inner.lock().await;
        if inner.active.as_ref() == Some(chat_id) {
            inner.peer_typing = typing;
        }
    }

    fn emit_unread(&self, total: i64) {
        for sink in self.sinks.iter() {
            sink.unread_count_changed(total);
        }
    }
}
