//! Live forms backed by [`FormEngine`].
//!
//! Each logical form in the library UI gets its own session: one "add book"
//! form, and one edit form per book row that is being edited. The session's
//! engine submit handler applies the change to the library.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use folio_engine::{
    FieldValues, FormEngine, FormSnapshot, RuleSet, SubmitEvent, SubmitOutcome,
};
use serde::{Deserialize, Serialize};

use crate::library::{Book, BookId, NewBook, SharedLibrary};
use crate::websocket::{ConnectionManager, ServerMessage};

pub type FormId = String;

/// Message shown for an empty title or number.
pub const REQUIRE_MESSAGE: &str = "Require";

/// Which library action a form performs on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FormKind {
    AddBook,
    #[serde(rename_all = "camelCase")]
    EditBook {
        book_id: BookId,
    },
}

impl FormKind {
    pub fn title_field(&self) -> String {
        match self {
            FormKind::AddBook => "title".to_string(),
            FormKind::EditBook { book_id } => format!("title-{}", book_id),
        }
    }

    pub fn number_field(&self) -> String {
        match self {
            FormKind::AddBook => "number".to_string(),
            FormKind::EditBook { book_id } => format!("number-{}", book_id),
        }
    }
}

fn book_field_rules() -> RuleSet {
    RuleSet::new().required(REQUIRE_MESSAGE)
}

type BookSlot = Arc<Mutex<Option<Book>>>;

/// One live form.
#[derive(Debug)]
pub struct FormSession {
    kind: FormKind,
    engine: FormEngine,
    /// Book produced by the most recent valid submit
    last_book: BookSlot,
}

impl FormSession {
    /// The "add book" form: empty `title` and `number`, both required.
    pub fn add_book(library: SharedLibrary) -> Self {
        let kind = FormKind::AddBook;
        let last_book: BookSlot = Arc::default();
        let slot = Arc::clone(&last_book);

        let title_field = kind.title_field();
        let number_field = kind.number_field();
        let (title_key, number_key) = (title_field.clone(), number_field.clone());

        let mut engine = FormEngine::new(move |values, _event| {
            let book = library.write().add(NewBook {
                title: field_value(values, &title_key),
                number: field_value(values, &number_key),
            });
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(book);
        });
        engine.register(title_field, book_field_rules());
        engine.register(number_field, book_field_rules());

        Self {
            kind,
            engine,
            last_book,
        }
    }

    /// The edit form of one row, seeded with the book's current values.
    pub fn edit_book(library: SharedLibrary, book: &Book) -> Self {
        let kind = FormKind::EditBook { book_id: book.id };
        let last_book: BookSlot = Arc::default();
        let slot = Arc::clone(&last_book);

        let title_field = kind.title_field();
        let number_field = kind.number_field();
        let (title_key, number_key) = (title_field.clone(), number_field.clone());
        let initial = FieldValues::from([
            (title_field.clone(), book.title.clone()),
            (number_field.clone(), book.number.clone()),
        ]);

        let book_id = book.id;
        let mut engine = FormEngine::new(move |values, _event| {
            let edited = library.write().edit(Book {
                id: book_id,
                title: field_value(values, &title_key),
                number: field_value(values, &number_key),
            });
            if edited.is_none() {
                tracing::warn!(book_id, "edit submitted for a book that no longer exists");
            }
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = edited;
        })
        .with_initial_values(initial);
        engine.register(title_field, book_field_rules());
        engine.register(number_field, book_field_rules());

        Self {
            kind,
            engine,
            last_book,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FormEngine {
        &mut self.engine
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.engine.snapshot()
    }

    /// Submit the form, returning the outcome and the book it produced.
    ///
    /// A successful edit becomes the row's new reset target, so cancelling
    /// afterwards shows the book as it is now.
    pub fn submit(&mut self, event: &mut SubmitEvent) -> (SubmitOutcome, Option<Book>) {
        let outcome = self.engine.on_submit(event);
        let book = self.take_book();

        if let (FormKind::EditBook { .. }, Some(book)) = (self.kind, &book) {
            self.engine.set_initial_values(FieldValues::from([
                (self.kind.title_field(), book.title.clone()),
                (self.kind.number_field(), book.number.clone()),
            ]));
        }

        (outcome, book)
    }

    /// Take the book produced by the last valid submit, if any.
    pub fn take_book(&self) -> Option<Book> {
        self.last_book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Push a snapshot to the form's WebSocket watchers after every transition.
    pub fn publish_to(&mut self, form_id: &str, conn_manager: Arc<ConnectionManager>) {
        let form_id = form_id.to_string();
        self.engine.subscribe(move |snapshot| {
            let message = ServerMessage::snapshot(&form_id, snapshot.clone());
            conn_manager.broadcast_to_form(&form_id, message);
        });
    }
}

fn field_value(values: &FieldValues, key: &str) -> String {
    values.get(key).cloned().unwrap_or_default()
}

/// All live forms, keyed by form ID.
///
/// Each session sits behind its own mutex, so transitions on one form never
/// interleave while different forms proceed independently.
#[derive(Debug, Default)]
pub struct FormRegistry {
    sessions: DashMap<FormId, Mutex<FormSession>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_with_id(&self, form_id: FormId, session: FormSession) {
        tracing::debug!(form_id = %form_id, kind = ?session.kind(), "form created");
        self.sessions.insert(form_id, Mutex::new(session));
    }

    /// Run `f` with exclusive access to a session.
    pub fn with_session<R>(
        &self,
        form_id: &str,
        f: impl FnOnce(&mut FormSession) -> R,
    ) -> Option<R> {
        let entry = self.sessions.get(form_id)?;
        let mut session = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut session))
    }

    pub fn contains(&self, form_id: &str) -> bool {
        self.sessions.contains_key(form_id)
    }

    /// Dispose of a form. Returns false if it did not exist.
    pub fn remove(&self, form_id: &str) -> bool {
        let removed = self.sessions.remove(form_id).is_some();
        if removed {
            tracing::debug!(form_id = %form_id, "form disposed");
        }
        removed
    }

    /// IDs of the edit forms open for a book.
    pub fn edit_forms_for(&self, book_id: BookId) -> Vec<FormId> {
        self.sessions
            .iter()
            .filter(|entry| {
                let session = entry.value().lock().unwrap_or_else(PoisonError::into_inner);
                session.kind() == FormKind::EditBook { book_id }
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
