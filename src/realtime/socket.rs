//! WebSocket handling for the realtime channel.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::realtime::messages::ClientMessage;
use crate::realtime::registry::SessionRegistry;

/// Drive one realtime connection until either side closes it.
///
/// The read side parses join frames and updates the registry; the write
/// side drains the connection's outbound channel. There is no server-side
/// leave: stale issue-room membership only costs irrelevant deliveries to
/// this connection and disappears on disconnect.
pub async fn handle_socket(socket: WebSocket, registry: Arc<SessionRegistry>) {
    let (connection, mut outbound) = registry.register().await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = outbound.recv() => {
                match event {
                    Some(message) => {
                        let text = match serde_json::to_string(&message) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("failed to serialize realtime frame: {e}");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Registry side closed the channel.
                    None => break,
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(frame) => {
                                registry.join(connection, frame.room()).await;
                            }
                            Err(e) => {
                                debug!("ignoring unparseable client frame: {e}");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Ping/pong handled by axum; binary frames ignored.
                    _ => {}
                }
            }
        }
    }

    registry.disconnect(connection).await;
}
