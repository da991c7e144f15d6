use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::event::model::{Command, Notification};
use crate::user;

use super::{Error, Result};

/// Live socket connection: commands go out through `commands`, pushed
/// notifications arrive on `notifications`. Dropping either end tears the
/// connection down; reconnection is the caller's responsibility, followed
/// by a session `resync` to re-join rooms and recover missed history.
pub struct Socket {
    pub commands: mpsc::UnboundedSender<Command>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

pub async fn connect(base_url: &str, me: &user::Sub) -> Result<Socket> {
    let url = format!("{}/ws", base_url.trim_end_matches('/'));

    let mut request = url.into_client_request()?;
    request.headers_mut().insert(
        user::PARTICIPANT_HEADER,
        HeaderValue::from_str(&me.0).map_err(|_| Error::Validation("bad identity".into()))?,
    );

    let (stream, _) = connect_async(request).await?;
    let (mut sink, mut source) = stream.split();

    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
    let (notification_tx, notification_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let payload = match serde_json::to_string(&command) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("failed to serialize command: {e}");
                    continue;
                }
            };

            if let Err(e) = sink.send(Message::Text(payload)).await {
                warn!("socket write failed: {e}");
                break;
            }
        }
    });

    tokio::spawn(async move {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(content)) => match serde_json::from_str(&content) {
                    Ok(notification) => {
                        if notification_tx.send(notification).is_err() {
                            break;
                        }
                    }
                    Err(_) => warn!("skipping malformed notification frame: {content}"),
                },
                Ok(Message::Close(frame)) => {
                    debug!("socket closed by server: {frame:?}");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("socket read failed: {e}");
                    break;
                }
            }
        }
    });

    Ok(Socket {
        commands: command_tx,
        notifications: notification_rx,
    })
}
