use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::chat::model::LastMessage;
use crate::{chat, user};

/// Transient notification for a message that arrived while no chat was
/// open. `chat_id` is the jump target: feeding it back into
/// `SessionManager::open_chat` opens the conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub chat_id: chat::Id,
    pub sender: user::Sub,
    pub sender_name: String,
    pub text: String,
}

/// One row of the recency-sorted chat preview.
#[derive(Clone, Debug)]
pub struct ChatPreview {
    pub chat_id: chat::Id,
    pub recipient: user::Sub,
    pub last_message: Option<LastMessage>,
    pub unread: i64,
}

/// Sink for session events, decoupled from any rendering mechanism.
pub trait EventSink: Send + Sync {
    fn message_arrived(&self, toast: &Toast);

    fn unread_count_changed(&self, total: i64);
}

const TOAST_CAPACITY: usize = 16;

/// Default sink: keeps the aggregate unread count and a bounded queue of
/// toasts for the UI to drain.
#[derive(Default)]
pub struct NotificationSurface {
    toasts: Mutex<VecDeque<Toast>>,
    total_unread: AtomicI64,
}

impl NotificationSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_unread(&self) -> i64 {
        self.total_unread.load(Ordering::Relaxed)
    }

    pub fn take_toasts(&self) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().expect("toast queue poisoned");
        toasts.drain(..).collect()
    }
}

impl EventSink for NotificationSurface {
    fn message_arrived(&self, toast: &Toast) {
        let mut toasts = self.toasts.lock().expect("toast queue poisoned");
        if toasts.len() == TOAST_CAPACITY {
            toasts.pop_front();
        }
        toasts.push_back(toast.clone());
    }

    fn unread_count_changed(&self, total: i64) {
        self.total_unread.store(total, Ordering::Relaxed);
    }
}
