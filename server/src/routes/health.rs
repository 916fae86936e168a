//! Liveness and library status.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Liveness plus a count of what the server is holding.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub books: usize,
    pub open_forms: usize,
    pub watchers: usize,
}

impl LibraryStatus {
    fn of(state: &AppState) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            books: state.library.read().len(),
            open_forms: state.forms.len(),
            watchers: state.conn_manager.connection_count(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(status_handler))
        .route("/", get(status_handler))
}

/// GET /health, GET / - Library status.
async fn status_handler(State(state): State<AppState>) -> Json<LibraryStatus> {
    Json(LibraryStatus::of(&state))
}
