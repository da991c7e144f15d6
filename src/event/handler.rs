use axum::extract::ws::Message::{Binary, Close, Text};
use axum::extract::ws::{self, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::Extension;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use serde_json::from_str;
use tokio::sync::mpsc;
use tokio::try_join;

use crate::chat::service::ChatService;
use crate::message::service::MessageService;
use crate::user;

use super::context;
use super::model::{Command, Notification};
use super::service::EventService;
use super::ConnectionId;

pub async fn ws(
    Extension(sub): Extension<user::Sub>,
    ws: WebSocketUpgrade,
    State(chat_service): State<ChatService>,
    State(message_service): State<MessageService>,
    State(event_service): State<EventService>,
) -> Response {
    ws.on_upgrade(move |socket| {
        handle_socket(sub, socket, chat_service, message_service, event_service)
    })
}

async fn handle_socket(
    logged_sub: user::Sub,
    ws: WebSocket,
    chat_service: ChatService,
    message_service: MessageService,
    event_service: EventService,
) {
    let ctx = context::Ws::new(ConnectionId::random(), logged_sub);

    let (tx, rx) = mpsc::unbounded_channel();
    event_service.register(ctx.connection_id.clone(), tx);

    let (sender, receiver) = ws.split();

    let read_task = tokio::spawn(read(
        ctx.clone(),
        receiver,
        chat_service,
        message_service,
        event_service.clone(),
    ));
    let write_task = tokio::spawn(write(ctx.clone(), sender, rx));

    match try_join!(read_task, write_task) {
        Ok(_) => debug!("WS disconnected gracefully"),
        Err(e) => error!("WS disconnected with error: {e}"),
    }

    // Connection close implicitly leaves every joined room.
    event_service.deregister(&ctx.connection_id);
}

async fn read(
    ctx: context::Ws,
    mut receiver: SplitStream<WebSocket>,
    chat_service: ChatService,
    message_service: MessageService,
    event_service: EventService,
) {
    loop {
        tokio::select! {
            // close is notified => stop 'read' task
            _ = ctx.close.notified() => break,

            // read next frame from WS connection
            frame = receiver.next() => {
                match frame {
                    None => {
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Failed to read WS frame: {e}");
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Ok(Close(frame))) => {
                        debug!("WS connection closed by client: {frame:?}");
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Ok(Text(content))) => {
                        handle_text_frame(
                            &ctx,
                            content.as_str(),
                            &chat_service,
                            &message_service,
                            &event_service,
                        )
                        .await;
                    }
                    Some(Ok(Binary(content))) => {
                        warn!("Received binary WS frame: {content:?}");
                    }
                    Some(Ok(wtf)) => warn!("Received non-text WS frame: {wtf:?}"),
                }
            }
        }
    }
}

/// Malformed frames are logged and skipped, never fatal to the connection.
async fn handle_text_frame(
    ctx: &context::Ws,
    content: &str,
    chat_service: &ChatService,
    message_service: &MessageService,
    event_service: &EventService,
) {
    let command = match from_str::<Command>(content) {
        Ok(command) => command,
        Err(_) => {
            warn!("Skipping text frame, content is malformed: {content}");
            return;
        }
    };

    match command {
        Command::JoinChat { chat_id } => {
            // Room membership is gated on chat membership, otherwise any
            // holder of a chat id could listen in.
            match chat_service.check_member(&chat_id, &ctx.logged_sub).await {
                Ok(_) => event_service.join(&ctx.connection_id, &chat_id),
                Err(e) => warn!("rejected join of {chat_id}: {e}"),
            }
        }
        Command::LeaveChat { chat_id } => event_service.leave(&ctx.connection_id, &chat_id),
        Command::SendMessage { chat_id, text } => {
            if let Err(e) = message_service
                .create(&chat_id, &ctx.logged_sub, &text)
                .await
            {
                warn!("failed to send message to {chat_id}: {e}");
            }
        }
        Command::Typing { chat_id } => event_service.broadcast(
            &chat_id,
            Notification::TypingStarted {
                chat_id: chat_id.clone(),
                participant: ctx.logged_sub.clone(),
            },
            Some(&ctx.connection_id),
        ),
        Command::StopTyping { chat_id } => event_service.broadcast(
            &chat_id,
            Notification::TypingStopped {
                chat_id: chat_id.clone(),
                participant: ctx.logged_sub.clone(),
            },
            Some(&ctx.connection_id),
        ),
    }
}

async fn write(
    ctx: context::Ws,
    mut sender: SplitSink<WebSocket, ws::Message>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) {
    loop {
        tokio::select! {
            // close is notified => stop 'write' task
            _ = ctx.close.notified() => break,

            // new notification => push it to the client
            item = notifications.recv() => {
                match item {
                    None => break,
                    Some(notification) => {
                        let payload = match serde_json::to_string(&notification) {
                            Ok(payload) => payload,
                            Err(e) => {
                                error!("Failed to serialize notification: {e}");
                                continue;
                            }
                        };

                        if let Err(e) = sender.send(Text(payload.into())).await {
                            error!("Failed to send notification to client: {e}");
                            ctx.close.notify_one();
                            break;
                        }
                    }
                }
            }
        }
    }
}
