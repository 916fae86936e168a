//! Book list routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_create_edit_form, handle_list_books, handle_remove_book, BookList, FormView,
};
use crate::library::BookId;
use crate::AppState;

/// Create book routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_handler))
        .route("/books/{id}", delete(remove_handler))
        .route("/books/{id}/forms", post(edit_form_handler))
}

/// GET /books - List books, newest first.
async fn list_handler(State(state): State<AppState>) -> Json<BookList> {
    Json(handle_list_books(&state))
}

/// DELETE /books/{id} - Remove a book.
async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<BookId>,
) -> Result<StatusCode> {
    handle_remove_book(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /books/{id}/forms - Open an edit form for a book.
async fn edit_form_handler(
    State(state): State<AppState>,
    Path(id): Path<BookId>,
) -> Result<(StatusCode, Json<FormView>)> {
    let view = handle_create_edit_form(&state, id)?;
    Ok((StatusCode::CREATED, Json(view)))
}
