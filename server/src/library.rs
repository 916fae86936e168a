//! The in-memory book list.
//!
//! Books are kept newest first. The list is shared between request handlers
//! and the submit handlers of the forms, so it lives behind [`SharedLibrary`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type BookId = u64;

/// A book in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    /// Number of copies, kept as the string the user typed
    pub number: String,
}

/// A book that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub number: String,
}

#[derive(Debug, Default)]
pub struct Library {
    books: Vec<Book>,
}

impl Library {
    pub fn new() -> Self {
        Self { books: Vec::new() }
    }

    /// A library holding the two demo books.
    pub fn seeded() -> Self {
        Self {
            books: vec![
                Book {
                    id: 1,
                    title: "Book 1".to_string(),
                    number: "1".to_string(),
                },
                Book {
                    id: 2,
                    title: "Book 2".to_string(),
                    number: "2".to_string(),
                },
            ],
        }
    }

    /// Add a book at the front of the list.
    pub fn add(&mut self, book: NewBook) -> Book {
        let book = Book {
            id: self.next_id(),
            title: book.title,
            number: book.number,
        };
        self.books.insert(0, book.clone());
        tracing::info!(book_id = book.id, title = %book.title, "book added");
        book
    }

    /// Remove a book. Returns false if no book has that id.
    pub fn remove(&mut self, id: BookId) -> bool {
        let before = self.books.len();
        self.books.retain(|b| b.id != id);
        let removed = self.books.len() != before;
        if removed {
            tracing::info!(book_id = id, "book removed");
        }
        removed
    }

    /// Update title and number of an existing book.
    pub fn edit(&mut self, book: Book) -> Option<Book> {
        let existing = self.books.iter_mut().find(|b| b.id == book.id)?;
        existing.title = book.title;
        existing.number = book.number;
        tracing::info!(book_id = existing.id, "book edited");
        Some(existing.clone())
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Epoch milliseconds plus a small random offset, bumped past the
    /// largest id in use.
    fn next_id(&self) -> BookId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        let candidate = now + rand::thread_rng().gen_range(0..100);
        match self.books.iter().map(|b| b.id).max() {
            Some(max) if candidate <= max => max + 1,
            _ => candidate,
        }
    }
}

/// Library handle shared across handlers.
///
/// Every mutation is a single push, retain or field assignment, so a poisoned
/// lock still guards a consistent list and is recovered.
#[derive(Debug, Clone, Default)]
pub struct SharedLibrary(Arc<RwLock<Library>>);

impl SharedLibrary {
    pub fn new(library: Library) -> Self {
        Self(Arc::new(RwLock::new(library)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Library> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Library> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
