//! Core domain logic for Luma, a local-first reading library.
//! This crate is the single source of truth for business invariants.

pub mod catalog;
pub mod config;
pub mod db;
pub mod gateway;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use gateway::{
    build_gateway, CapturedImage, EnrichmentGateway, GatewayBackend, GatewayError,
    GatewayResult, GeminiGateway, MockGateway,
};
pub use i18n::{translate, Locale};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::book::{
    Book, BookId, BookOverlay, BookRef, BookValidationError, Completeness, ReadingStatus,
};
pub use model::NavigationRequest;
pub use repo::local_storage::{LocalStorage, SqliteLocalStorage, StorageError, StorageResult};
pub use service::detail_session::{
    DetailError, DetailPhase, DetailSession, EnrichOutcome, EnrichmentOffer, SaveToggle,
};
pub use service::library_store::{
    lock_library, HydrationSource, LibraryStore, SharedLibrary, StatusCounts, StatusFilter,
    StoreError, LIBRARY_STORAGE_KEY,
};
pub use service::record_resolver::{resolve_record, RecordSource, RESOLUTION_ORDER};
pub use service::scan_session::{FrameSource, ScanMode, ScanOutcome, ScanSession};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
