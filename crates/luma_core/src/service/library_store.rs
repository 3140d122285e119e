//! Persistent reading library.
//!
//! # Responsibility
//! - Own the ordered collection of saved book records.
//! - Hydrate once from local storage, falling back to the seed catalog.
//! - Persist the full collection after every mutation.
//!
//! # Invariants
//! - Ids are unique; new records are prepended (most recent first).
//! - Nothing is written to storage before hydration completes, so an early
//!   mutation can never clobber the stored library with a default set.
//! - Write failures are logged and swallowed; the in-memory collection stays
//!   authoritative for the session.
//! - Enrichment upgrades go through [`LibraryStore::apply_overlay`], so a
//!   stored record never drops back to a lower completeness tier.

use crate::catalog::seed_books;
use crate::model::book::{Book, BookOverlay, ReadingStatus};
use crate::repo::local_storage::LocalStorage;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Local storage key holding the JSON-serialized library.
pub const LIBRARY_STORAGE_KEY: &str = "luma-library";

/// Process-wide handle shared by every view.
pub type SharedLibrary = Arc<Mutex<LibraryStore>>;

/// Locks a shared library, recovering the data from a poisoned lock.
///
/// The store holds plain data with no cross-field invariant that a panic
/// mid-mutation could break, so the inner value is still usable.
pub fn lock_library(library: &SharedLibrary) -> MutexGuard<'_, LibraryStore> {
    library.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where the hydrated collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    /// A valid payload was read from storage.
    Stored,
    /// No payload existed; the seed catalog was used.
    SeedMissing,
    /// The payload did not parse as a library; the seed catalog was used.
    SeedMalformed,
    /// Storage could not be read; the seed catalog was used.
    SeedUnreadable,
}

impl HydrationSource {
    pub fn is_seed(self) -> bool {
        self != Self::Stored
    }
}

/// Library lifecycle error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    AlreadyHydrated,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyHydrated => write!(f, "library was already hydrated for this process"),
        }
    }
}

impl Error for StoreError {}

/// Status filter used by the library list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReadingStatus),
}

impl StatusFilter {
    pub fn matches(self, book: &Book) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => book.status == status,
        }
    }
}

/// Per-status counts of the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub to_read: usize,
    pub reading: usize,
    pub read: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.to_read + self.reading + self.read
    }
}

/// Ordered, persisted collection of saved book records.
pub struct LibraryStore {
    storage: Box<dyn LocalStorage>,
    books: Vec<Book>,
    hydrated: bool,
}

impl LibraryStore {
    /// Creates an empty, not yet hydrated store over `storage`.
    pub fn new(storage: impl LocalStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            books: Vec::new(),
            hydrated: false,
        }
    }

    /// Wraps this store into the shared process-wide handle.
    pub fn into_shared(self) -> SharedLibrary {
        Arc::new(Mutex::new(self))
    }

    /// Hydrates the collection from local storage.
    ///
    /// Missing, malformed or unreadable payloads are replaced with the seed
    /// catalog. A seeded library is written back immediately, except when
    /// storage was unreadable: that payload may still be recoverable.
    ///
    /// # Errors
    /// - `StoreError::AlreadyHydrated` on any call after the first.
    pub fn load(&mut self) -> Result<HydrationSource, StoreError> {
        if self.hydrated {
            warn!("event=library_load module=store status=rejected reason=already_hydrated");
            return Err(StoreError::AlreadyHydrated);
        }

        if !self.books.is_empty() {
            warn!(
                "event=library_load module=store status=discard_pending count={}",
                self.books.len()
            );
        }

        let (books, source) = match self.storage.get_item(LIBRARY_STORAGE_KEY) {
            Ok(Some(payload)) => match parse_library(&payload) {
                Some(books) => (books, HydrationSource::Stored),
                None => (seed_books(), HydrationSource::SeedMalformed),
            },
            Ok(None) => (seed_books(), HydrationSource::SeedMissing),
            Err(err) => {
                error!(
                    "event=library_load module=store status=error error_code=storage_read_failed error={err}"
                );
                (seed_books(), HydrationSource::SeedUnreadable)
            }
        };

        self.books = books;
        self.hydrated = true;
        info!(
            "event=library_load module=store status=ok source={:?} count={}",
            source,
            self.books.len()
        );

        if source.is_seed() && source != HydrationSource::SeedUnreadable {
            self.persist();
        }

        Ok(source)
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// All records, most recently added first.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Prepends `book` unless its id is already present.
    ///
    /// Returns `true` when the collection changed.
    pub fn add(&mut self, book: Book) -> bool {
        if self.contains(&book.id) {
            debug!("event=library_add module=store status=noop reason=duplicate_id");
            return false;
        }
        self.books.insert(0, book);
        self.persist();
        true
    }

    /// Removes the record with `id`; absent ids are not an error.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|book| book.id != id);
        if self.books.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Replaces only the `status` field of the record with `id`.
    pub fn update_status(&mut self, id: &str, status: ReadingStatus) -> bool {
        let Some(book) = self.books.iter_mut().find(|book| book.id == id) else {
            return false;
        };
        book.status = status;
        self.persist();
        true
    }

    /// Overlays enrichment onto the stored record in place.
    ///
    /// Returns the upgraded record, or `None` when `id` is not saved.
    pub fn apply_overlay(&mut self, id: &str, overlay: &BookOverlay) -> Option<Book> {
        let book = self.books.iter_mut().find(|book| book.id == id)?;
        book.apply_overlay(overlay);
        let upgraded = book.clone();
        self.persist();
        Some(upgraded)
    }

    /// Records matching `filter`, in library order.
    pub fn filtered(&self, filter: StatusFilter) -> Vec<Book> {
        self.books
            .iter()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.books
            .iter()
            .fold(StatusCounts::default(), |mut counts, book| {
                match book.status {
                    ReadingStatus::ToRead => counts.to_read += 1,
                    ReadingStatus::Reading => counts.reading += 1,
                    ReadingStatus::Read => counts.read += 1,
                }
                counts
            })
    }

    fn persist(&mut self) {
        if !self.hydrated {
            debug!("event=library_persist module=store status=skipped reason=not_hydrated");
            return;
        }

        let payload = match serde_json::to_string(&self.books) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=library_persist module=store status=error error_code=serialize_failed error={err}"
                );
                return;
            }
        };

        match self.storage.set_item(LIBRARY_STORAGE_KEY, &payload) {
            Ok(()) => debug!(
                "event=library_persist module=store status=ok count={} bytes={}",
                self.books.len(),
                payload.len()
            ),
            Err(err) => error!(
                "event=library_persist module=store status=error error_code=storage_write_failed error={err}"
            ),
        }
    }
}

/// Parses a stored payload; any shape mismatch counts as absent.
fn parse_library(payload: &str) -> Option<Vec<Book>> {
    let books: Vec<Book> = match serde_json::from_str(payload) {
        Ok(books) => books,
        Err(err) => {
            warn!(
                "event=library_parse module=store status=malformed line={} column={}",
                err.line(),
                err.column()
            );
            return None;
        }
    };

    if let Some(err) = books.iter().find_map(|book| book.validate().err()) {
        warn!("event=library_parse module=store status=invalid_record error={err}");
        return None;
    }

    let mut seen = HashSet::new();
    let before = books.len();
    let books = books
        .into_iter()
        .filter(|book| seen.insert(book.id.clone()))
        .collect::<Vec<_>>();
    if books.len() != before {
        warn!(
            "event=library_parse module=store status=deduplicated dropped={}",
            before - books.len()
        );
    }

    Some(books)
}
