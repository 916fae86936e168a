//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and use snake_case for field names. Form
//! snapshots keep their own camelCase layout.

use folio_engine::{FieldError, FieldValues, FormSnapshot};
use serde::{Deserialize, Serialize};

use crate::library::Book;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A field's value changed.
    Change {
        field_id: String,
        value: String,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Submit the form.
    Submit {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Reset the form, optionally to new values.
    Reset {
        #[serde(default)]
        values: Option<FieldValues>,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Form state after a transition.
    /// Sent to every connection watching the form.
    Snapshot {
        form_id: String,
        snapshot: FormSnapshot,
    },

    /// Response to a submit request.
    SubmitResult {
        submitted: bool,
        /// Failing fields, empty when submitted
        errors: Vec<FieldError>,
        /// The book that was added or edited
        #[serde(skip_serializing_if = "Option::is_none")]
        book: Option<Book>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// The form was disposed; no further snapshots will follow.
    Closed { form_id: String },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a snapshot notification.
    pub fn snapshot(form_id: impl Into<String>, snapshot: FormSnapshot) -> Self {
        ServerMessage::Snapshot {
            form_id: form_id.into(),
            snapshot,
        }
    }
}
