//! WebSocket handler for live forms.
//!
//! A connection watches exactly one form. It receives a snapshot after every
//! transition of that form and may send change, submit and reset messages.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::websocket::{ClientMessage, ServerMessage};
use crate::AppState;

use super::{handle_change, handle_get_form, handle_reset, handle_submit, ResetRequest};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Spawns a task to forward outgoing messages
/// 3. Sends the form's current snapshot
/// 4. Processes incoming messages in a loop
/// 5. Cleans up on disconnect, or once the form is disposed
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState, form_id: String) {
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_manager = state.conn_manager.clone();
    let conn_id = conn_manager.register(form_id.clone(), tx);

    tracing::info!(
        conn_id = %conn_id,
        form_id = %form_id,
        "WebSocket client connected"
    );

    let mut send_task = tokio::spawn(forward_messages(rx, ws_sender));

    let initial = match handle_get_form(&state, &form_id) {
        Ok(view) => ServerMessage::snapshot(&form_id, view.snapshot),
        Err(e) => ServerMessage::error(e.to_string(), None),
    };
    conn_manager.send_to(&conn_id, initial);

    loop {
        let result = tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(result) => result,
                None => break,
            },
            // The form was disposed, or the socket stopped accepting writes.
            _ = &mut send_task => {
                tracing::debug!(conn_id = %conn_id, "send task finished");
                break;
            }
        };

        match result {
            Ok(Message::Text(text)) => {
                if let Some(response) = process_message(&text, &state, &form_id) {
                    conn_manager.send_to(&conn_id, response);
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        form_id = %form_id,
        active_connections = conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Forward outgoing messages to the socket.
///
/// Returns after a `closed` message, which is followed by a close frame, or
/// once the channel or the sink is gone.
async fn forward_messages<S>(mut rx: mpsc::UnboundedReceiver<ServerMessage>, mut sink: S)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(msg) = rx.recv().await {
        let closing = matches!(msg, ServerMessage::Closed { .. });

        match serde_json::to_string(&msg) {
            Ok(text) => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!("Failed to send WebSocket message: {}", e);
                    return;
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize WebSocket message: {}", e);
            }
        }

        if closing {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!("Failed to send close frame: {}", e);
            }
            return;
        }
    }
}

/// Process a client message.
///
/// Changes and resets have no direct reply: the snapshot broadcast after the
/// transition reaches this connection too.
fn process_message(text: &str, state: &AppState, form_id: &str) -> Option<ServerMessage> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return Some(ServerMessage::error(
                format!("Invalid message format: {}", e),
                None,
            ));
        }
    };

    match client_msg {
        ClientMessage::Change {
            field_id,
            value,
            request_id,
        } => handle_change(state, form_id, &field_id, value)
            .err()
            .map(|e| ServerMessage::error(e.to_string(), request_id)),

        ClientMessage::Submit { request_id } => {
            let message = match handle_submit(state, form_id, Some("websocket".to_string())) {
                Ok(response) => ServerMessage::SubmitResult {
                    submitted: response.submitted,
                    errors: response.errors,
                    book: response.book,
                    request_id,
                },
                Err(e) => ServerMessage::error(e.to_string(), request_id),
            };
            Some(message)
        }

        ClientMessage::Reset { values, request_id } => {
            handle_reset(state, form_id, ResetRequest { values })
                .err()
                .map(|e| ServerMessage::error(e.to_string(), request_id))
        }

        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}
