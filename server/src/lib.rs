//! Folio Server - a small book library driven by live, validated forms.
//!
//! Every form in the library UI is a [`folio_engine::FormEngine`] held by the
//! server. HTTP routes and WebSocket connections send change, submit and reset
//! events to it, and watchers receive a snapshot after every transition.

pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod library;
mod routes;
pub mod websocket;

use crate::config::Config;
use crate::forms::FormRegistry;
use crate::library::{Library, SharedLibrary};
use crate::websocket::ConnectionManager;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub library: SharedLibrary,
    pub forms: Arc<FormRegistry>,
    pub conn_manager: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let library = if config.seed_books {
            Library::seeded()
        } else {
            Library::new()
        };

        Self {
            config: Arc::new(config),
            library: SharedLibrary::new(library),
            forms: FormRegistry::new_shared(),
            conn_manager: ConnectionManager::new_shared(),
        }
    }
}

/// Build the application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
