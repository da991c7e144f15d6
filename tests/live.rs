use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use gharelu_chat::chat;
use gharelu_chat::client::api::{ChatApi, HttpChatApi};
use gharelu_chat::client::socket::{self, Socket};
use gharelu_chat::client::Error;
use gharelu_chat::event::model::{Command, Notification};
use gharelu_chat::user::{Sub, PARTICIPANT_HEADER};

mod common;

async fn recv(socket: &mut Socket) -> Notification {
    tokio::time::timeout(Duration::from_secs(2), socket.notifications.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("socket task ended")
}

async fn expect_silence(socket: &mut Socket) {
    let outcome =
        tokio::time::timeout(Duration::from_millis(200), socket.notifications.recv()).await;
    if let Ok(notification) = outcome {
        panic!("expected no notification, got {notification:?}");
    }
}

#[tokio::test]
async fn rest_api_round_trips_over_http() {
    let state = common::test_state().await;
    let addr = common::spawn_server(state).await;
    let base = format!("http://{addr}");

    let buyer = HttpChatApi::new(&base, Sub::from("user-1"));
    let agent = HttpChatApi::new(&base, Sub::from("agent-1"));

    let created = buyer.create_chat(&Sub::from("agent-1")).await.unwrap();
    assert!(!created.already_exists);

    let again = agent.create_chat(&Sub::from("user-1")).await.unwrap();
    assert!(again.already_exists);
    assert_eq!(again.chat.id, created.chat.id);

    let sent = agent
        .send_message(&created.chat.id, "hello from the agency")
        .await
        .unwrap();
    assert_eq!(sent.text, "hello from the agency");

    let chats = buyer.list_chats().await.unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].recipient, Sub::from("agent-1"));
    assert_eq!(chats[0].unread, 1);

    let detail = buyer.fetch_chat(&created.chat.id).await.unwrap();
    assert_eq!(detail.messages.len(), 1);

    tokio::time::sleep(Duration::from_millis(5)).await;
    buyer.mark_read(&created.chat.id).await.unwrap();
    let chats = buyer.list_chats().await.unwrap();
    assert_eq!(chats[0].unread, 0);

    let outsider = HttpChatApi::new(&base, Sub::from("agent-2"));
    assert!(matches!(
        outsider.fetch_chat(&created.chat.id).await,
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        buyer.fetch_chat(&chat::Id::random()).await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        agent.send_message(&created.chat.id, "   ").await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn socket_delivers_room_broadcasts_and_gates_joins_on_membership() {
    let state = common::test_state().await;
    let (u1, a1) = (Sub::from("user-1"), Sub::from("agent-1"));
    let chat = state.chat_service.create_or_get(&u1, &a1).await.unwrap().chat;
    let addr = common::spawn_server(state).await;
    let ws_base = format!("ws://{addr}");

    // Without the identity header the upgrade is refused outright.
    let bare = format!("{ws_base}/ws").into_client_request().unwrap();
    assert!(connect_async(bare).await.is_err());

    let mut buyer = socket::connect(&ws_base, &u1).await.unwrap();
    let mut agent = socket::connect(&ws_base, &a1).await.unwrap();
    let mut outsider = socket::connect(&ws_base, &Sub::from("agent-2")).await.unwrap();

    for socket in [&buyer, &agent, &outsider] {
        socket
            .commands
            .send(Command::JoinChat {
                chat_id: chat.id.clone(),
            })
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    buyer
        .commands
        .send(Command::SendMessage {
            chat_id: chat.id.clone(),
            text: "is the flat still available?".into(),
        })
        .unwrap();

    match recv(&mut agent).await {
        Notification::MessageReceived { message } => {
            assert_eq!(message.text, "is the flat still available?");
            assert_eq!(message.sender, u1);
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    // The sender gets the authoritative echo too.
    assert!(matches!(
        recv(&mut buyer).await,
        Notification::MessageReceived { .. }
    ));
    // The outsider's join was rejected, the broadcast never reached it.
    expect_silence(&mut outsider).await;

    agent
        .commands
        .send(Command::Typing {
            chat_id: chat.id.clone(),
        })
        .unwrap();

    match recv(&mut buyer).await {
        Notification::TypingStarted { chat_id, participant } => {
            assert_eq!(chat_id, chat.id);
            assert_eq!(participant, a1);
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    // Typing is never echoed back to its originator.
    expect_silence(&mut agent).await;
}

#[tokio::test]
async fn malformed_frames_are_skipped_without_dropping_the_connection() {
    let state = common::test_state().await;
    let (u1, a1) = (Sub::from("user-1"), Sub::from("agent-1"));
    let chat = state.chat_service.create_or_get(&u1, &a1).await.unwrap().chat;
    let addr = common::spawn_server(state.clone()).await;

    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request
        .headers_mut()
        .insert(PARTICIPANT_HEADER, HeaderValue::from_static("user-1"));
    let (mut stream, _) = connect_async(request).await.unwrap();

    stream
        .send(Message::Text("not even json".into()))
        .await
        .unwrap();
    let join = serde_json::to_string(&Command::JoinChat {
        chat_id: chat.id.clone(),
    })
    .unwrap();
    stream.send(Message::Text(join)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    state
        .message_service
        .create(&chat.id, &a1, "after the garbage")
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection dropped")
        .unwrap();
    match frame {
        Message::Text(content) => {
            let notification: Notification = serde_json::from_str(&content).unwrap();
            assert!(matches!(notification, Notification::MessageReceived { .. }));
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    stream.close(None).await.unwrap();
}
