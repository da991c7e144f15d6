use gharelu_chat::chat;
use gharelu_chat::user::Sub;

mod common;

#[tokio::test]
async fn create_or_get_is_idempotent_regardless_of_argument_order() {
    let state = common::test_state().await;
    let (u1, a1) = (Sub::from("user-1"), Sub::from("agent-1"));

    let first = state.chat_service.create_or_get(&u1, &a1).await.unwrap();
    assert!(!first.already_exists);

    let second = state.chat_service.create_or_get(&a1, &u1).await.unwrap();
    assert!(second.already_exists);
    assert_eq!(first.chat.id, second.chat.id);

    let third = state.chat_service.create_or_get(&u1, &a1).await.unwrap();
    assert!(third.already_exists);
    assert_eq!(first.chat.id, third.chat.id);
}

#[tokio::test]
async fn chat_with_yourself_is_rejected() {
    let state = common::test_state().await;
    let me = Sub::from("user-1");

    let result = state.chat_service.create_or_get(&me, &me).await;

    assert!(matches!(result, Err(chat::Error::SelfChat)));
}

#[tokio::test]
async fn chat_list_is_ordered_by_most_recent_activity() {
    let state = common::test_state().await;
    let me = Sub::from("user-1");

    let old = state
        .chat_service
        .create_or_get(&me, &Sub::from("agent-1"))
        .await
        .unwrap();
    let recent = state
        .chat_service
        .create_or_get(&me, &Sub::from("agent-2"))
        .await
        .unwrap();

    state
        .message_service
        .create(&old.chat.id, &me, "first")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    state
        .message_service
        .create(&recent.chat.id, &me, "second")
        .await
        .unwrap();

    let chats = state.chat_service.find_all(&me).await.unwrap();

    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].id, recent.chat.id);
    assert_eq!(chats[1].id, old.chat.id);
}

#[tokio::test]
async fn outsiders_are_denied_access() {
    let state = common::test_state().await;
    let chat = state
        .chat_service
        .create_or_get(&Sub::from("user-1"), &Sub::from("agent-1"))
        .await
        .unwrap()
        .chat;
    let outsider = Sub::from("lurker");

    let read = state.chat_service.find_by_id(&chat.id, &outsider).await;
    assert!(matches!(read, Err(chat::Error::NotMember)));

    let history = state
        .message_service
        .find_by_chat_id(&chat.id, &outsider, None)
        .await;
    assert!(history.is_err());

    let send = state
        .message_service
        .create(&chat.id, &outsider, "let me in")
        .await;
    assert!(send.is_err());
}

#[tokio::test]
async fn missing_chat_is_not_found() {
    let state = common::test_state().await;

    let result = state
        .chat_service
        .find_by_id(&chat::Id::random(), &Sub::from("user-1"))
        .await;

    assert!(matches!(result, Err(chat::Error::NotFound(_))));
}

#[tokio::test]
async fn mark_read_zeroes_the_unread_count() {
    let state = common::test_state().await;
    let (u1, a1) = (Sub::from("user-1"), Sub::from("agent-1"));
    let chat = state.chat_service.create_or_get(&u1, &a1).await.unwrap().chat;

    state.message_service.create(&chat.id, &a1, "hi").await.unwrap();
    state.message_service.create(&chat.id, &a1, "there").await.unwrap();

    let before = state.chat_service.find_by_id(&chat.id, &u1).await.unwrap();
    assert_eq!(before.unread, 2);

    state.chat_service.mark_read(&chat.id, &u1).await.unwrap();
    let after = state.chat_service.find_by_id(&chat.id, &u1).await.unwrap();
    assert_eq!(after.unread, 0);

    // The next message from the counterpart brings it back to exactly 1.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    state.message_service.create(&chat.id, &a1, "again").await.unwrap();
    let next = state.chat_service.find_by_id(&chat.id, &u1).await.unwrap();
    assert_eq!(next.unread, 1);
}

#[tokio::test]
async fn own_messages_never_count_as_unread() {
    let state = common::test_state().await;
    let (u1, a1) = (Sub::from("user-1"), Sub::from("agent-1"));
    let chat = state.chat_service.create_or_get(&u1, &a1).await.unwrap().chat;

    state.message_service.create(&chat.id, &u1, "hello").await.unwrap();

    let mine = state.chat_service.find_by_id(&chat.id, &u1).await.unwrap();
    assert_eq!(mine.unread, 0);

    let theirs = state.chat_service.find_by_id(&chat.id, &a1).await.unwrap();
    assert_eq!(theirs.unread, 1);
}
