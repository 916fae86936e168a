//! Form routes.

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use folio_engine::FormSnapshot;

use crate::error::{AppError, Result};
use crate::handlers::{
    handle_change, handle_create_add_form, handle_dispose, handle_get_form, handle_reset,
    handle_restore, handle_submit, handle_websocket_connection, ChangeRequest, FormView,
    ResetRequest, SubmitResponse,
};
use crate::AppState;

/// Create form routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forms", post(create_handler))
        .route("/forms/{form_id}", get(get_handler).delete(dispose_handler))
        .route("/forms/{form_id}/fields/{name}", put(change_handler))
        .route("/forms/{form_id}/submit", post(submit_handler))
        .route("/forms/{form_id}/reset", post(reset_handler))
        .route("/forms/{form_id}/snapshot", put(restore_handler))
        .route("/forms/{form_id}/ws", get(ws_handler))
}

/// POST /forms - Open an "add book" form.
async fn create_handler(State(state): State<AppState>) -> (StatusCode, Json<FormView>) {
    (StatusCode::CREATED, Json(handle_create_add_form(&state)))
}

/// GET /forms/{form_id} - Current form state.
async fn get_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<FormView>> {
    Ok(Json(handle_get_form(&state, &form_id)?))
}

/// DELETE /forms/{form_id} - Dispose of a form.
async fn dispose_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<StatusCode> {
    handle_dispose(&state, &form_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /forms/{form_id}/fields/{name} - A field's value changed.
async fn change_handler(
    State(state): State<AppState>,
    Path((form_id, name)): Path<(String, String)>,
    Json(request): Json<ChangeRequest>,
) -> Result<Json<FormSnapshot>> {
    Ok(Json(handle_change(&state, &form_id, &name, request.value)?))
}

/// POST /forms/{form_id}/submit - Submit a form.
///
/// A rejected submit is still a 200: the failure is reported in the body.
async fn submit_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<SubmitResponse>> {
    let source = format!("/forms/{}/submit", form_id);
    Ok(Json(handle_submit(&state, &form_id, Some(source))?))
}

/// POST /forms/{form_id}/reset - Reset a form.
async fn reset_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<FormSnapshot>> {
    Ok(Json(handle_reset(&state, &form_id, request)?))
}

/// PUT /forms/{form_id}/snapshot - Restore a saved snapshot.
async fn restore_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(snapshot): Json<FormSnapshot>,
) -> Result<Json<FormSnapshot>> {
    Ok(Json(handle_restore(&state, &form_id, snapshot)?))
}

/// GET /forms/{form_id}/ws - Watch and drive a form over WebSocket.
async fn ws_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    if !state.forms.contains(&form_id) {
        return Err(AppError::form_not_found(&form_id));
    }
    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, state, form_id)))
}
