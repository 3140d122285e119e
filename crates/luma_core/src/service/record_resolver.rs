//! Working-record resolution for the detail view.
//!
//! # Invariants
//! - Sources are tried in [`RESOLUTION_ORDER`]; the first match wins.
//! - The fallback source always matches, so resolution is total.
//! - A navigation payload only counts for the route it was sent with.

use crate::catalog::{fallback_book, find_seed_book};
use crate::model::book::Book;
use log::warn;

/// Candidate source of a working record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Saved copy in the library (authoritative for status).
    Library,
    /// Transient record passed with the route change.
    Navigation,
    /// Static seed catalog entry.
    SeedCatalog,
    /// Hard-coded default record.
    Fallback,
}

/// Strict priority of record sources.
pub const RESOLUTION_ORDER: [RecordSource; 4] = [
    RecordSource::Library,
    RecordSource::Navigation,
    RecordSource::SeedCatalog,
    RecordSource::Fallback,
];

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    pub book: Book,
    pub source: RecordSource,
}

impl RecordSource {
    fn lookup(self, id: &str, library: &[Book], navigation: Option<&Book>) -> Option<Book> {
        match self {
            Self::Library => library.iter().find(|book| book.id == id).cloned(),
            Self::Navigation => {
                let book = navigation?;
                if book.id != id {
                    warn!("event=record_resolve module=detail status=ignored reason=navigation_id_mismatch");
                    return None;
                }
                Some(book.clone())
            }
            Self::SeedCatalog => find_seed_book(id),
            Self::Fallback => Some(fallback_book()),
        }
    }
}

/// Resolves the working record for route `id`.
pub fn resolve_record(id: &str, library: &[Book], navigation: Option<&Book>) -> ResolvedRecord {
    RESOLUTION_ORDER
        .iter()
        .find_map(|source| {
            source
                .lookup(id, library, navigation)
                .map(|book| ResolvedRecord {
                    book,
                    source: *source,
                })
        })
        .unwrap_or_else(|| ResolvedRecord {
            book: fallback_book(),
            source: RecordSource::Fallback,
        })
}

#[cfg(test)]
mod tests {
    use super::{resolve_record, RecordSource, RESOLUTION_ORDER};
    use crate::model::book::{Book, ReadingStatus};

    #[test]
    fn order_is_library_navigation_seed_fallback() {
        assert_eq!(
            RESOLUTION_ORDER,
            [
                RecordSource::Library,
                RecordSource::Navigation,
                RecordSource::SeedCatalog,
                RecordSource::Fallback,
            ]
        );
    }

    #[test]
    fn library_copy_beats_navigation_and_seed() {
        let mut saved = Book::stub("dune", "Dune", "Frank Herbert");
        saved.status = ReadingStatus::Reading;
        let passed = Book::stub("dune", "Dune (passed)", "Frank Herbert");

        let resolved = resolve_record("dune", &[saved.clone()], Some(&passed));
        assert_eq!(resolved.source, RecordSource::Library);
        assert_eq!(resolved.book, saved);
    }

    #[test]
    fn navigation_beats_seed() {
        let passed = Book::stub("dune", "Dune (passed)", "Frank Herbert");
        let resolved = resolve_record("dune", &[], Some(&passed));
        assert_eq!(resolved.source, RecordSource::Navigation);
        assert_eq!(resolved.book.title, "Dune (passed)");
    }

    #[test]
    fn mismatched_navigation_payload_is_ignored() {
        let passed = Book::stub("other", "Other", "Someone");
        let resolved = resolve_record("dune", &[], Some(&passed));
        assert_eq!(resolved.source, RecordSource::SeedCatalog);
    }

    #[test]
    fn unknown_id_resolves_to_fallback() {
        let resolved = resolve_record("nowhere", &[], None);
        assert_eq!(resolved.source, RecordSource::Fallback);
        assert_eq!(resolved.book.id, "meditations");
    }
}
