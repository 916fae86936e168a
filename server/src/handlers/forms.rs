//! Form handlers - drive a form session from HTTP or WebSocket requests.

use folio_engine::{
    ChangeEvent, FieldError, FieldValues, FormSnapshot, SubmitEvent, SubmitOutcome,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::forms::{FormId, FormKind, FormSession};
use crate::library::{Book, BookId};
use crate::AppState;

/// A form as seen by clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub form_id: FormId,
    pub kind: FormKind,
    pub snapshot: FormSnapshot,
}

/// Request body for a field change.
#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub value: String,
}

/// Request body for a reset.
#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    /// Values to reset to instead of the form's initial values
    #[serde(default)]
    pub values: Option<FieldValues>,
}

/// Response for a submit attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submitted: bool,
    /// Failing fields, empty when submitted
    pub errors: Vec<FieldError>,
    /// The book that was added or edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<Book>,
    pub snapshot: FormSnapshot,
}

fn register_session(state: &AppState, mut session: FormSession) -> FormView {
    let form_id = uuid::Uuid::new_v4().to_string();
    session.publish_to(&form_id, state.conn_manager.clone());

    let view = FormView {
        form_id: form_id.clone(),
        kind: session.kind(),
        snapshot: session.snapshot(),
    };
    state.forms.insert_with_id(form_id, session);
    view
}

/// Open a new "add book" form.
pub fn handle_create_add_form(state: &AppState) -> FormView {
    register_session(state, FormSession::add_book(state.library.clone()))
}

/// Open an edit form for a book row.
pub fn handle_create_edit_form(state: &AppState, book_id: BookId) -> Result<FormView> {
    let book = state
        .library
        .read()
        .get(book_id)
        .cloned()
        .ok_or_else(|| AppError::book_not_found(book_id))?;

    Ok(register_session(
        state,
        FormSession::edit_book(state.library.clone(), &book),
    ))
}

/// Current state of a form.
pub fn handle_get_form(state: &AppState, form_id: &str) -> Result<FormView> {
    state
        .forms
        .with_session(form_id, |session| FormView {
            form_id: form_id.to_string(),
            kind: session.kind(),
            snapshot: session.snapshot(),
        })
        .ok_or_else(|| AppError::form_not_found(form_id))
}

/// Apply a change event to a registered field.
pub fn handle_change(
    state: &AppState,
    form_id: &str,
    field_id: &str,
    value: String,
) -> Result<FormSnapshot> {
    state
        .forms
        .with_session(form_id, |session| {
            let engine = session.engine_mut();
            if !engine.is_registered(field_id) {
                return Err(AppError::BadRequest(format!("unknown field: {}", field_id)));
            }
            engine.on_change(ChangeEvent::new(field_id, value));
            Ok(engine.snapshot())
        })
        .ok_or_else(|| AppError::form_not_found(form_id))?
}

/// Submit a form.
pub fn handle_submit(
    state: &AppState,
    form_id: &str,
    source: Option<String>,
) -> Result<SubmitResponse> {
    state
        .forms
        .with_session(form_id, |session| {
            let mut event = source.map(SubmitEvent::from_source).unwrap_or_default();
            let (outcome, book) = session.submit(&mut event);

            let (submitted, errors) = match outcome {
                SubmitOutcome::Submitted(_) => (true, Vec::new()),
                SubmitOutcome::Rejected(errors) => (false, errors),
            };

            SubmitResponse {
                submitted,
                errors,
                book,
                snapshot: session.snapshot(),
            }
        })
        .ok_or_else(|| AppError::form_not_found(form_id))
}

/// Reset a form to its initial values, or to the given ones.
pub fn handle_reset(
    state: &AppState,
    form_id: &str,
    request: ResetRequest,
) -> Result<FormSnapshot> {
    state
        .forms
        .with_session(form_id, |session| {
            session.engine_mut().reset(request.values);
            session.snapshot()
        })
        .ok_or_else(|| AppError::form_not_found(form_id))
}

/// Replace a form's state with a previously saved snapshot.
///
/// The snapshot must name exactly the form's fields.
pub fn handle_restore(
    state: &AppState,
    form_id: &str,
    snapshot: FormSnapshot,
) -> Result<FormSnapshot> {
    state
        .forms
        .with_session(form_id, |session| -> Result<FormSnapshot> {
            if snapshot.fields != session.engine().fields() {
                return Err(AppError::BadRequest(
                    "snapshot fields do not match the form".to_string(),
                ));
            }
            session.engine_mut().import_state(snapshot)?;
            Ok(session.snapshot())
        })
        .ok_or_else(|| AppError::form_not_found(form_id))?
}

/// Dispose of a form and close its WebSocket watchers.
pub fn handle_dispose(state: &AppState, form_id: &str) -> Result<()> {
    if !state.forms.remove(form_id) {
        return Err(AppError::form_not_found(form_id));
    }
    let closed = state.conn_manager.close_form(form_id);
    tracing::debug!(form_id = %form_id, closed, "closed form watchers");
    Ok(())
}
