//! Book list handlers.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::library::{Book, BookId};
use crate::AppState;

/// Response for the book list.
#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<Book>,
    pub total: usize,
}

/// List books, newest first.
pub fn handle_list_books(state: &AppState) -> BookList {
    let library = state.library.read();
    BookList {
        books: library.list().to_vec(),
        total: library.len(),
    }
}

/// Remove a book and dispose of any edit forms open for it.
pub fn handle_remove_book(state: &AppState, book_id: BookId) -> Result<()> {
    if !state.library.write().remove(book_id) {
        return Err(AppError::book_not_found(book_id));
    }

    for form_id in state.forms.edit_forms_for(book_id) {
        state.forms.remove(&form_id);
        state.conn_manager.close_form(&form_id);
    }

    Ok(())
}
