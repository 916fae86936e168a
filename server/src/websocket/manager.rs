//! WebSocket connection manager.
//!
//! Tracks the connections watching each form and fans form snapshots out to
//! them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::ServerMessage;

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: String,
    /// Form this connection is watching
    pub form_id: String,
    /// Channel to send messages to this connection
    pub sender: MessageSender,
}

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
    /// Index of connections by form ID.
    by_form_id: DashMap<String, Vec<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            by_form_id: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection for a form.
    ///
    /// Returns the connection ID.
    pub fn register(&self, form_id: String, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        let connection = Connection {
            id: conn_id.clone(),
            form_id: form_id.clone(),
            sender,
        };

        self.connections.insert(conn_id.clone(), connection);
        self.by_form_id
            .entry(form_id)
            .or_default()
            .push(conn_id.clone());

        tracing::info!(conn_id = %conn_id, "WebSocket connection registered");

        conn_id
    }

    /// Unregister a connection.
    pub fn unregister(&self, conn_id: &str) {
        if let Some((_, conn)) = self.connections.remove(conn_id) {
            if let Some(mut conn_ids) = self.by_form_id.get_mut(&conn.form_id) {
                conn_ids.retain(|id| id != conn_id);
                if conn_ids.is_empty() {
                    drop(conn_ids);
                    self.by_form_id.remove(&conn.form_id);
                }
            }

            tracing::info!(
                conn_id = %conn_id,
                form_id = %conn.form_id,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Send a message to every connection watching a form.
    ///
    /// Returns the number of connections that received the message.
    pub fn broadcast_to_form(&self, form_id: &str, message: ServerMessage) -> usize {
        let Some(conn_ids) = self.by_form_id.get(form_id).map(|ids| ids.clone()) else {
            return 0;
        };

        let mut sent_count = 0;
        for conn_id in &conn_ids {
            if self.send_to(conn_id, message.clone()) {
                sent_count += 1;
            }
        }

        tracing::trace!(form_id = %form_id, recipients = sent_count, "Broadcast message to form");

        sent_count
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: ServerMessage) -> bool {
        match self.connections.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Tell every connection on a form that it is gone and drop them.
    ///
    /// Returns the number of connections closed.
    pub fn close_form(&self, form_id: &str) -> usize {
        let Some((_, conn_ids)) = self.by_form_id.remove(form_id) else {
            return 0;
        };

        for conn_id in &conn_ids {
            if let Some((_, conn)) = self.connections.remove(conn_id) {
                let _ = conn.sender.send(ServerMessage::Closed {
                    form_id: form_id.to_string(),
                });
            }
        }

        conn_ids.len()
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of connections watching a form.
    pub fn form_connection_count(&self, form_id: &str) -> usize {
        self.by_form_id.get(form_id).map_or(0, |ids| ids.len())
    }
}
