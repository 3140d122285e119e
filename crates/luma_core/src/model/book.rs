//! Book record domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by the library, scanner and detail
//!   views.
//! - Define the additive overlay used to enrich a record in place.
//!
//! # Invariants
//! - `id` is stable and unique within the library.
//! - Completeness is derived from field presence and only ever advances
//!   (`Stub -> Basic -> Deep`) through [`Book::apply_overlay`].
//! - An overlay never clears a populated field; it only replaces fields it
//!   supplies.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque stable identifier of a book record.
///
/// Seed records use readable slugs (`dune`), AI-originated records use a
/// prefixed random id (`scanned-<uuid>`), so this stays a plain string.
pub type BookId = String;

/// User-controlled reading status.
///
/// Serialized with the display strings of the stored library payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[default]
    #[serde(rename = "To Read")]
    ToRead,
    #[serde(rename = "Reading")]
    Reading,
    #[serde(rename = "Read")]
    Read,
}

impl ReadingStatus {
    /// All statuses in display order.
    pub const ALL: [ReadingStatus; 3] = [Self::ToRead, Self::Reading, Self::Read];

    /// Stored display string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToRead => "To Read",
            Self::Reading => "Reading",
            Self::Read => "Read",
        }
    }

    /// Translation key of the status label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::ToRead => "lib.filter.toread",
            Self::Reading => "lib.filter.reading",
            Self::Read => "lib.filter.read",
        }
    }

    /// Parses the stored display string or a snake/lower-case variant.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "to read" | "to_read" | "toread" => Some(Self::ToRead),
            "reading" => Some(Self::Reading),
            "read" => Some(Self::Read),
            _ => None,
        }
    }
}

/// Lightweight `{title, author}` reference to a recommended book.
///
/// Not a full record and not guaranteed to exist in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl BookRef {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Derived completeness of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Completeness {
    /// Only identity/display fields are known.
    Stub,
    /// Summary, category and main ideas are known.
    Basic,
    /// Author biography (and with it the deep tier) is known.
    Deep,
}

/// Canonical book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Remote URL, embedded `data:` image payload, or empty.
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_ideas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<BookRef>>,
}

/// Validation errors for book records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    EmptyId,
    EmptyTitle(BookId),
    EmptyAuthor(BookId),
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "book id must not be empty"),
            Self::EmptyTitle(id) => write!(f, "book `{id}` has an empty title"),
            Self::EmptyAuthor(id) => write!(f, "book `{id}` has an empty author"),
        }
    }
}

impl Error for BookValidationError {}

impl Book {
    /// Creates a stub record with a caller-provided id.
    pub fn stub(
        id: impl Into<BookId>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            year: None,
            cover_url: String::new(),
            status: ReadingStatus::ToRead,
            summary: None,
            philosophy: None,
            category: None,
            main_ideas: None,
            influences: None,
            historical_context: None,
            detailed_bio: None,
            recommendations: None,
        }
    }

    /// Returns the derived completeness tier.
    ///
    /// Absence of `summary` is the stub signal even when deeper fields exist.
    pub fn completeness(&self) -> Completeness {
        if !has_text(&self.summary) {
            Completeness::Stub
        } else if has_text(&self.detailed_bio) {
            Completeness::Deep
        } else {
            Completeness::Basic
        }
    }

    pub fn is_stub(&self) -> bool {
        self.completeness() == Completeness::Stub
    }

    /// Checks the fields required once a record leaves the scanner.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        if self.id.trim().is_empty() {
            return Err(BookValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(BookValidationError::EmptyTitle(self.id.clone()));
        }
        if self.author.trim().is_empty() {
            return Err(BookValidationError::EmptyAuthor(self.id.clone()));
        }
        Ok(())
    }

    /// Applies an enrichment overlay in place.
    ///
    /// Rule: a field is replaced only when the overlay supplies it. Blank
    /// strings and empty lists in the overlay count as "not supplied", so an
    /// overlay can never erase populated data.
    pub fn apply_overlay(&mut self, overlay: &BookOverlay) {
        overlay_text(&mut self.summary, &overlay.summary);
        overlay_text(&mut self.philosophy, &overlay.philosophy);
        overlay_text(&mut self.category, &overlay.category);
        overlay_list(&mut self.main_ideas, &overlay.main_ideas);
        overlay_list(&mut self.influences, &overlay.influences);
        overlay_text(&mut self.historical_context, &overlay.historical_context);
        overlay_text(&mut self.detailed_bio, &overlay.detailed_bio);
        overlay_list(&mut self.recommendations, &overlay.recommendations);
    }

    /// Returns a copy with `overlay` applied.
    pub fn merged(&self, overlay: &BookOverlay) -> Self {
        let mut merged = self.clone();
        merged.apply_overlay(overlay);
        merged
    }
}

/// Partial enrichment result produced by the gateway.
///
/// Field list: summary, philosophy, category, main ideas, influences,
/// historical context, detailed bio, recommendations. Identity, display
/// metadata and status are deliberately absent: enrichment cannot touch them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_ideas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<BookRef>>,
}

impl BookOverlay {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Generates a fresh, non content-derived record id such as `scanned-<uuid>`.
pub fn new_record_id(prefix: &str) -> BookId {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn overlay_text(target: &mut Option<String>, source: &Option<String>) {
    if has_text(source) {
        target.clone_from(source);
    }
}

fn overlay_list<T: Clone>(target: &mut Option<Vec<T>>, source: &Option<Vec<T>>) {
    if let Some(items) = source {
        if !items.is_empty() {
            *target = Some(items.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{new_record_id, Book, BookOverlay, Completeness, ReadingStatus};

    #[test]
    fn completeness_follows_summary_and_bio_presence() {
        let mut book = Book::stub("x", "T", "A");
        assert_eq!(book.completeness(), Completeness::Stub);

        book.detailed_bio = Some("bio".to_string());
        assert_eq!(book.completeness(), Completeness::Stub);

        book.summary = Some("summary".to_string());
        assert_eq!(book.completeness(), Completeness::Deep);

        book.detailed_bio = None;
        assert_eq!(book.completeness(), Completeness::Basic);
    }

    #[test]
    fn blank_overlay_fields_do_not_erase_existing_values() {
        let mut book = Book::stub("x", "T", "A");
        book.summary = Some("kept".to_string());
        book.main_ideas = Some(vec!["one".to_string()]);

        book.apply_overlay(&BookOverlay {
            summary: Some("   ".to_string()),
            main_ideas: Some(Vec::new()),
            ..BookOverlay::default()
        });

        assert_eq!(book.summary.as_deref(), Some("kept"));
        assert_eq!(book.main_ideas, Some(vec!["one".to_string()]));
    }

    #[test]
    fn status_uses_display_strings_on_the_wire() {
        let json = serde_json::to_string(&ReadingStatus::ToRead).unwrap();
        assert_eq!(json, "\"To Read\"");
        assert_eq!(ReadingStatus::parse(" to read "), Some(ReadingStatus::ToRead));
        assert_eq!(ReadingStatus::parse("finished"), None);
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let first = new_record_id("scanned");
        let second = new_record_id("scanned");
        assert!(first.starts_with("scanned-"));
        assert_ne!(first, second);
    }
}
