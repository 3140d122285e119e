//! Domain model for the reading library.
//!
//! # Responsibility
//! - Define the book record, its completeness tiers and enrichment overlay.
//! - Define the navigation payload handed from scanner to detail views.
//!
//! # Invariants
//! - Every record is identified by a stable `BookId`.
//! - Enrichment is additive; see [`book::Book::apply_overlay`].

pub mod book;

use book::{Book, BookId};

/// Route change carrying an optional transient record.
///
/// The detail view treats `book` as a candidate distinct from `route_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub route_id: BookId,
    pub book: Option<Book>,
}

impl NavigationRequest {
    /// Navigation to a transient record that is not in the library.
    pub fn with_transient(book: Book) -> Self {
        Self {
            route_id: book.id.clone(),
            book: Some(book),
        }
    }

    /// Plain navigation by id.
    pub fn to_id(route_id: impl Into<BookId>) -> Self {
        Self {
            route_id: route_id.into(),
            book: None,
        }
    }
}
