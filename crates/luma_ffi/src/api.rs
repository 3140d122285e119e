//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose library, scanner and detail use cases to Dart via FRB.
//! - Own the process-wide library, gateway, async runtime and the mounted
//!   scanner/detail views.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - A scanner or detail view lives from `*_open` to `*_close`; every
//!   trigger on the same handle goes through that one session, so a second
//!   trigger while a gateway call is pending starts nothing.
//! - Gateway-backed calls are plain (worker-thread) FRB functions; only
//!   storage-backed calls are `sync`.
//! - Every failure comes back inside the response envelope.

use crate::session_registry::SessionRegistry;
use luma_core::catalog::{curated_authors, partition_golden_age, CuratedAuthor};
use luma_core::{
    build_gateway, core_version as core_version_inner, init_logging as init_logging_inner,
    lock_library, ping as ping_inner, Book, BookRef, CapturedImage, Completeness, CoreConfig,
    DetailError, DetailPhase, DetailSession, EnrichOutcome, EnrichmentGateway, FrameSource,
    LibraryStore, Locale, NavigationRequest, ReadingStatus, ScanOutcome, ScanSession,
    SharedLibrary, SqliteLocalStorage, StatusFilter,
};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::runtime::Runtime;

static APP: OnceCell<AppContext> = OnceCell::new();

struct AppContext {
    config: CoreConfig,
    library: SharedLibrary,
    gateway: Arc<dyn EnrichmentGateway>,
    runtime: Runtime,
    scans: SessionRegistry<ScanSession>,
    details: SessionRegistry<DetailSession>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Recommendation shown on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationItem {
    pub title: String,
    pub author: String,
}

/// Flat book record as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub year: Option<String>,
    pub cover_url: String,
    /// `To Read|Reading|Read`.
    pub status: String,
    pub summary: Option<String>,
    pub philosophy: Option<String>,
    pub category: Option<String>,
    pub main_ideas: Vec<String>,
    pub influences: Vec<String>,
    pub historical_context: Option<String>,
    pub detailed_bio: Option<String>,
    pub recommendations: Vec<RecommendationItem>,
    /// `stub|basic|deep`.
    pub tier: String,
}

/// Library listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryListResponse {
    pub items: Vec<BookItem>,
    pub to_read: u32,
    pub reading: u32,
    pub read: u32,
    pub message: String,
}

/// Curated author with the books shown under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorItem {
    pub id: String,
    pub name: String,
    pub years: String,
    pub description: String,
    pub books: Vec<BookItem>,
}

/// Curated authors split into the golden-age collection and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorsResponse {
    pub golden_age: Vec<AuthorItem>,
    pub others: Vec<AuthorItem>,
    pub message: String,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Scanner envelope; `book` is set only for `outcome == "navigate"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResponse {
    /// `navigate|not_found|failed|ignored`.
    pub outcome: String,
    pub book: Option<BookItem>,
    /// Localized error text for `not_found` and `failed`.
    pub message: String,
}

/// Detail envelope carrying the record the page should now show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailResponse {
    pub ok: bool,
    /// View handle; `0` when no view was opened.
    pub handle: u64,
    pub book: Option<BookItem>,
    pub saved: bool,
    /// `idle_stub|idle_basic|idle_deep|enriching`.
    pub phase: String,
    /// Another gateway call of this view is still pending.
    pub busy: bool,
    pub message: String,
}

/// Lists the library, optionally filtered by status label.
///
/// # FFI contract
/// - Sync call, storage-backed.
/// - Unknown filter labels list everything and say so in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn library_list(status: Option<String>) -> LibraryListResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => {
            return LibraryListResponse {
                items: Vec::new(),
                to_read: 0,
                reading: 0,
                read: 0,
                message: err,
            }
        }
    };

    let (filter, message) = match status.as_deref().map(str::trim) {
        None | Some("") | Some("All") => (StatusFilter::All, String::new()),
        Some(raw) => match ReadingStatus::parse(raw) {
            Some(status) => (StatusFilter::Only(status), String::new()),
            None => (
                StatusFilter::All,
                format!("unknown status filter `{raw}`; listing all"),
            ),
        },
    };

    let store = lock_library(&app.library);
    let counts = store.status_counts();
    LibraryListResponse {
        items: store.filtered(filter).iter().map(to_book_item).collect(),
        to_read: count_u32(counts.to_read),
        reading: count_u32(counts.reading),
        read: count_u32(counts.read),
        message,
    }
}

/// Changes the status of a saved record.
#[flutter_rust_bridge::frb(sync)]
pub fn library_set_status(id: String, status: String) -> ActionResponse {
    let Some(parsed) = ReadingStatus::parse(&status) else {
        return ActionResponse::failure(format!("unknown status `{}`", status.trim()));
    };
    let app = match app() {
        Ok(app) => app,
        Err(err) => return ActionResponse::failure(err),
    };
    if lock_library(&app.library).update_status(id.trim(), parsed) {
        ActionResponse::success("Status updated.")
    } else {
        ActionResponse::failure(format!("book `{}` is not in the library", id.trim()))
    }
}

/// Removes a record; unknown ids succeed as a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn library_remove(id: String) -> ActionResponse {
    match app() {
        Ok(app) => {
            let removed = lock_library(&app.library).remove(id.trim());
            ActionResponse::success(if removed { "Removed." } else { "Not in library." })
        }
        Err(err) => ActionResponse::failure(err),
    }
}

/// Curated authors; saved books show their library copy.
#[flutter_rust_bridge::frb(sync)]
pub fn authors_list() -> AuthorsResponse {
    match app() {
        Ok(app) => app.authors(),
        Err(err) => AuthorsResponse {
            golden_age: Vec::new(),
            others: Vec::new(),
            message: err,
        },
    }
}

/// Mounts a scanner view and returns its handle (`0` on failure).
#[flutter_rust_bridge::frb(sync)]
pub fn scan_open(locale: Option<String>) -> u64 {
    match app() {
        Ok(app) => app.scan_open(locale),
        Err(err) => {
            error!("event=ffi_scan_open module=ffi status=error error={err}");
            0
        }
    }
}

/// Identifies a book from one JPEG frame.
///
/// # FFI contract
/// - Blocking worker-thread call; waits for the gateway.
/// - Returns `ignored` while another call of the same view is pending.
pub fn scan_identify(handle: u64, jpeg_bytes: Vec<u8>) -> ScanResponse {
    match app() {
        Ok(app) => app.scan_identify(handle, jpeg_bytes),
        Err(err) => scan_failure(err),
    }
}

/// Searches a book by title/author text.
pub fn scan_search(handle: u64, query: String) -> ScanResponse {
    match app() {
        Ok(app) => app.scan_search(handle, &query),
        Err(err) => scan_failure(err),
    }
}

/// Reports that the camera feed could not be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn scan_camera_unavailable(handle: u64) -> ScanResponse {
    match app() {
        Ok(app) => app.scan_camera_unavailable(handle),
        Err(err) => scan_failure(err),
    }
}

/// Unmounts a scanner view; a pending call finishes without navigating.
#[flutter_rust_bridge::frb(sync)]
pub fn scan_close(handle: u64) -> ActionResponse {
    match app() {
        Ok(app) => app.scan_close(handle),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Mounts a detail view for `id`, with the optional transient record the
/// navigation carried.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_open(
    id: String,
    transient: Option<BookItem>,
    locale: Option<String>,
) -> DetailResponse {
    match app() {
        Ok(app) => app.detail_open(id, transient, locale),
        Err(err) => detail_failure(0, err),
    }
}

/// Re-reads the detail record after the library changed elsewhere.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_refresh(handle: u64) -> DetailResponse {
    with_detail(handle, |_, session| {
        session.refresh();
        Ok(detail_ok(handle, session, String::new()))
    })
}

/// Runs deep enrichment on the detail record.
///
/// # FFI contract
/// - Blocking worker-thread call; waits for the gateway.
/// - Returns `busy` while another call of the same view is pending.
pub fn detail_enrich(handle: u64) -> DetailResponse {
    match app() {
        Ok(app) => app.detail_enrich(handle),
        Err(err) => detail_failure(handle, err),
    }
}

/// Saves or unsaves the detail record.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_toggle_saved(handle: u64) -> DetailResponse {
    with_detail(handle, |_, session| {
        session.toggle_saved();
        Ok(detail_ok(handle, session, session.toast().unwrap_or_default()))
    })
}

/// Changes the status of the saved detail record.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_set_status(handle: u64, status: String) -> DetailResponse {
    with_detail(handle, |_, session| {
        let parsed = ReadingStatus::parse(&status)
            .ok_or_else(|| format!("unknown status `{}`", status.trim()))?;
        match session.set_status(parsed) {
            Ok(()) => Ok(detail_ok(handle, session, "Status updated.")),
            Err(err @ DetailError::NotSaved(_)) => Err(err.to_string()),
            Err(err) => Err(format!("detail_set_status failed: {err}")),
        }
    })
}

/// Asks a question about the detail record; soft-fails into text.
///
/// Returns an empty string for blank questions, while another call of the
/// same view is pending, or after the view closed.
pub fn detail_ask(handle: u64, question: String) -> String {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return err,
    };
    match app.details.get(handle) {
        Some(session) => app
            .runtime
            .block_on(session.ask(&question))
            .unwrap_or_default(),
        None => unknown_handle("detail", handle),
    }
}

/// Moves the detail view to the recommendation at `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_open_recommendation(handle: u64, index: u32) -> DetailResponse {
    with_detail(handle, |_, session| {
        let request = usize::try_from(index)
            .ok()
            .and_then(|index| session.recommendation(index))
            .ok_or_else(|| format!("no recommendation at index {index}"))?;
        session.navigate(request);
        Ok(detail_ok(handle, session, String::new()))
    })
}

/// Unmounts a detail view; a pending enrichment still upgrades a saved
/// record but no longer touches the view.
#[flutter_rust_bridge::frb(sync)]
pub fn detail_close(handle: u64) -> ActionResponse {
    match app() {
        Ok(app) => app.detail_close(handle),
        Err(err) => ActionResponse::failure(err),
    }
}

impl AppContext {
    fn new(
        config: CoreConfig,
        storage: SqliteLocalStorage,
        gateway: Arc<dyn EnrichmentGateway>,
    ) -> Result<Self, String> {
        let mut store = LibraryStore::new(storage);
        store
            .load()
            .map_err(|err| format!("library load failed: {err}"))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("async runtime init failed: {err}"))?;

        Ok(Self {
            config,
            library: store.into_shared(),
            gateway,
            runtime,
            scans: SessionRegistry::new(),
            details: SessionRegistry::new(),
        })
    }

    fn locale(&self, requested: Option<String>) -> Locale {
        match requested.as_deref().map(str::trim) {
            None | Some("") => self.config.locale,
            Some(raw) => Locale::parse(raw).unwrap_or_else(|| {
                warn!(
                    "event=ffi_locale module=ffi status=invalid fallback={}",
                    self.config.locale.code()
                );
                self.config.locale
            }),
        }
    }

    fn authors(&self) -> AuthorsResponse {
        let store = lock_library(&self.library);
        let to_item = |author: CuratedAuthor| AuthorItem {
            id: author.id.to_string(),
            name: author.name.to_string(),
            years: author.years.to_string(),
            description: author.description.to_string(),
            books: author
                .books
                .iter()
                .map(|seed| to_book_item(store.get(&seed.id).unwrap_or(seed)))
                .collect(),
        };
        let (golden_age, others) = partition_golden_age(curated_authors());
        AuthorsResponse {
            golden_age: golden_age.into_iter().map(to_item).collect(),
            others: others.into_iter().map(to_item).collect(),
            message: String::new(),
        }
    }

    fn scan_open(&self, locale: Option<String>) -> u64 {
        let session = ScanSession::open(self.gateway.clone(), self.locale(locale));
        let handle = self.scans.insert(session);
        info!(
            "event=ffi_view_open module=ffi status=ok view=scan handle={handle} open={}",
            self.scans.len()
        );
        handle
    }

    fn scan_identify(&self, handle: u64, jpeg_bytes: Vec<u8>) -> ScanResponse {
        let Some(session) = self.scans.get(handle) else {
            return scan_failure(unknown_handle("scan", handle));
        };
        let frame = OneFrame(CapturedImage::jpeg(jpeg_bytes));
        let outcome = self.runtime.block_on(session.capture(&frame));
        to_scan_response(outcome, session.error())
    }

    fn scan_search(&self, handle: u64, query: &str) -> ScanResponse {
        let Some(session) = self.scans.get(handle) else {
            return scan_failure(unknown_handle("scan", handle));
        };
        let outcome = self.runtime.block_on(session.search(query));
        to_scan_response(outcome, session.error())
    }

    fn scan_camera_unavailable(&self, handle: u64) -> ScanResponse {
        let Some(session) = self.scans.get(handle) else {
            return scan_failure(unknown_handle("scan", handle));
        };
        session.report_camera_unavailable();
        to_scan_response(ScanOutcome::Failed, session.error())
    }

    fn scan_close(&self, handle: u64) -> ActionResponse {
        match self.scans.remove(handle) {
            Some(session) => {
                session.close();
                ActionResponse::success("Closed.")
            }
            None => ActionResponse::failure(unknown_handle("scan", handle)),
        }
    }

    fn detail_open(
        &self,
        id: String,
        transient: Option<BookItem>,
        locale: Option<String>,
    ) -> DetailResponse {
        let transient = match transient.map(from_book_item).transpose() {
            Ok(book) => book,
            Err(err) => return detail_failure(0, err),
        };
        let request = NavigationRequest {
            route_id: id.trim().to_string(),
            book: transient,
        };
        let session = DetailSession::open(
            self.library.clone(),
            self.gateway.clone(),
            self.locale(locale),
            request,
        );
        let handle = self.details.insert(session);
        info!(
            "event=ffi_view_open module=ffi status=ok view=detail handle={handle} open={}",
            self.details.len()
        );
        match self.details.get(handle) {
            Some(session) => detail_ok(handle, &session, String::new()),
            None => detail_failure(handle, unknown_handle("detail", handle)),
        }
    }

    fn with_detail(
        &self,
        handle: u64,
        f: impl FnOnce(&AppContext, &DetailSession) -> Result<DetailResponse, String>,
    ) -> DetailResponse {
        match self.details.get(handle) {
            Some(session) => {
                f(self, &*session).unwrap_or_else(|err| detail_failure(handle, err))
            }
            None => detail_failure(handle, unknown_handle("detail", handle)),
        }
    }

    fn detail_enrich(&self, handle: u64) -> DetailResponse {
        self.with_detail(handle, |app, session| {
            match app.runtime.block_on(session.enrich()) {
                Ok(EnrichOutcome::Applied { persisted, .. }) => Ok(detail_ok(
                    handle,
                    session,
                    if persisted { "Enriched and saved." } else { "Enriched." },
                )),
                Ok(EnrichOutcome::AlreadyComplete) => {
                    Ok(detail_ok(handle, session, "Analysis already complete."))
                }
                Ok(EnrichOutcome::Busy) => Ok(DetailResponse {
                    ok: false,
                    ..detail_ok(handle, session, "Enrichment already running.")
                }),
                Ok(EnrichOutcome::Detached { persisted }) => Err(format!(
                    "view closed before enrichment finished (saved copy upgraded: {persisted})"
                )),
                Err(err) => Err(format!("detail_enrich failed: {err}")),
            }
        })
    }

    fn detail_close(&self, handle: u64) -> ActionResponse {
        match self.details.remove(handle) {
            Some(session) => {
                session.close();
                ActionResponse::success("Closed.")
            }
            None => ActionResponse::failure(unknown_handle("detail", handle)),
        }
    }
}

struct OneFrame(CapturedImage);

impl FrameSource for OneFrame {
    fn capture_frame(&self) -> Option<CapturedImage> {
        Some(self.0.clone())
    }
}

fn app() -> Result<&'static AppContext, String> {
    APP.get_or_try_init(|| {
        let config = CoreConfig::from_env();
        let storage = match SqliteLocalStorage::open(&config.db_path) {
            Ok(storage) => storage,
            Err(err) => {
                error!(
                    "event=ffi_storage_open module=ffi status=error fallback=in_memory error={err}"
                );
                SqliteLocalStorage::in_memory()
                    .map_err(|err| format!("local storage unavailable: {err}"))?
            }
        };
        let gateway =
            build_gateway(&config).map_err(|err| format!("gateway init failed: {err}"))?;
        AppContext::new(config, storage, gateway)
    })
}

fn with_detail(
    handle: u64,
    f: impl FnOnce(&AppContext, &DetailSession) -> Result<DetailResponse, String>,
) -> DetailResponse {
    match app() {
        Ok(app) => app.with_detail(handle, f),
        Err(err) => detail_failure(handle, err),
    }
}

fn unknown_handle(view: &str, handle: u64) -> String {
    warn!("event=ffi_view_lookup module=ffi status=missing view={view} handle={handle}");
    format!("no open {view} view with handle {handle}")
}

fn detail_ok(handle: u64, session: &DetailSession, message: impl Into<String>) -> DetailResponse {
    DetailResponse {
        ok: true,
        handle,
        book: Some(to_book_item(&session.working())),
        saved: session.is_saved(),
        phase: phase_label(session.phase()).to_string(),
        busy: session.is_busy(),
        message: message.into(),
    }
}

fn detail_failure(handle: u64, message: String) -> DetailResponse {
    DetailResponse {
        ok: false,
        handle,
        book: None,
        saved: false,
        phase: String::new(),
        busy: false,
        message,
    }
}

fn phase_label(phase: DetailPhase) -> &'static str {
    match phase {
        DetailPhase::IdleStub => "idle_stub",
        DetailPhase::IdleBasic => "idle_basic",
        DetailPhase::IdleDeep => "idle_deep",
        DetailPhase::Enriching => "enriching",
    }
}

fn scan_failure(message: String) -> ScanResponse {
    ScanResponse {
        outcome: "failed".to_string(),
        book: None,
        message,
    }
}

fn to_scan_response(outcome: ScanOutcome, error_text: Option<String>) -> ScanResponse {
    let (label, book) = match outcome {
        ScanOutcome::Navigate(request) => ("navigate", request.book.as_ref().map(to_book_item)),
        ScanOutcome::NotFound => ("not_found", None),
        ScanOutcome::Failed => ("failed", None),
        ScanOutcome::Ignored => ("ignored", None),
    };
    ScanResponse {
        outcome: label.to_string(),
        book,
        message: error_text.unwrap_or_default(),
    }
}

fn to_book_item(book: &Book) -> BookItem {
    BookItem {
        id: book.id.clone(),
        title: book.title.clone(),
        author: book.author.clone(),
        year: book.year.clone(),
        cover_url: book.cover_url.clone(),
        status: book.status.as_str().to_string(),
        summary: book.summary.clone(),
        philosophy: book.philosophy.clone(),
        category: book.category.clone(),
        main_ideas: book.main_ideas.clone().unwrap_or_default(),
        influences: book.influences.clone().unwrap_or_default(),
        historical_context: book.historical_context.clone(),
        detailed_bio: book.detailed_bio.clone(),
        recommendations: book
            .recommendations
            .iter()
            .flatten()
            .map(|reference| RecommendationItem {
                title: reference.title.clone(),
                author: reference.author.clone(),
            })
            .collect(),
        tier: match book.completeness() {
            Completeness::Stub => "stub",
            Completeness::Basic => "basic",
            Completeness::Deep => "deep",
        }
        .to_string(),
    }
}

fn from_book_item(item: BookItem) -> Result<Book, String> {
    let status = ReadingStatus::parse(&item.status)
        .ok_or_else(|| format!("unknown status `{}`", item.status))?;
    let list = |values: Vec<String>| (!values.is_empty()).then_some(values);

    let mut book = Book::stub(item.id, item.title, item.author);
    book.year = item.year;
    book.cover_url = item.cover_url;
    book.status = status;
    book.summary = item.summary;
    book.philosophy = item.philosophy;
    book.category = item.category;
    book.main_ideas = list(item.main_ideas);
    book.influences = list(item.influences);
    book.historical_context = item.historical_context;
    book.detailed_bio = item.detailed_bio;
    book.recommendations = (!item.recommendations.is_empty()).then(|| {
        item.recommendations
            .into_iter()
            .map(|reference| BookRef::new(reference.title, reference.author))
            .collect()
    });
    book.validate().map_err(|err| err.to_string())?;
    Ok(book)
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        authors_list, core_version, detail_ask, detail_close, detail_enrich, detail_open,
        detail_open_recommendation, detail_set_status, detail_toggle_saved, init_logging,
        library_list, library_remove, library_set_status, ping, scan_close, scan_identify,
        scan_open, scan_search, AppContext,
    };
    use luma_core::{lock_library, Completeness, CoreConfig, MockGateway, SqliteLocalStorage};
    use std::sync::{Arc, Barrier, Once};
    use std::time::Duration;

    static TEST_ENV: Once = Once::new();

    fn use_test_env() {
        TEST_ENV.call_once(|| {
            let path = std::env::temp_dir().join(format!(
                "luma-ffi-test-{}.sqlite3",
                std::process::id()
            ));
            let _ = std::fs::remove_file(&path);
            std::env::set_var("LUMA_DB_PATH", &path);
            std::env::set_var("LUMA_MOCK_DELAY_MS", "0");
            std::env::set_var("LUMA_LOCALE", "en");
            std::env::remove_var("GEMINI_API_KEY");
            std::env::remove_var("API_KEY");
        });
    }

    /// Private context over a slow mock, so two triggers overlap.
    fn slow_context(delay_ms: u64) -> (AppContext, Arc<MockGateway>) {
        let mock = Arc::new(MockGateway::with_delay(Duration::from_millis(delay_ms)));
        let config =
            CoreConfig::from_lookup(|key| (key == "LUMA_LOCALE").then(|| "en".to_string()));
        let storage = SqliteLocalStorage::in_memory().unwrap();
        let app = AppContext::new(config, storage, mock.clone()).unwrap();
        (app, mock)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/luma-logs".to_string()).is_empty());
    }

    #[test]
    fn library_list_filters_and_rejects_unknown_labels() {
        use_test_env();
        let all = library_list(None);
        assert!(all.message.is_empty(), "{}", all.message);
        assert!(!all.items.is_empty());

        let reading = library_list(Some("Reading".to_string()));
        assert!(reading.items.iter().all(|item| item.status == "Reading"));

        let unknown = library_list(Some("Someday".to_string()));
        assert!(unknown.message.contains("unknown status filter"));
    }

    #[test]
    fn set_status_requires_a_known_status_and_saved_id() {
        use_test_env();
        assert!(!library_set_status("dune".to_string(), "Later".to_string()).ok);
        assert!(!library_set_status("missing".to_string(), "Read".to_string()).ok);
        assert!(library_set_status("gideon-ninth".to_string(), "Reading".to_string()).ok);

        let detail = detail_open("gideon-ninth".to_string(), None, None);
        assert_eq!(detail.book.unwrap().status, "Reading");
        assert!(detail_close(detail.handle).ok);
    }

    #[test]
    fn authors_are_split_into_golden_age_and_others() {
        use_test_env();
        let authors = authors_list();
        assert!(authors.message.is_empty(), "{}", authors.message);

        let names: Vec<&str> = authors.golden_age.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Austen", "Mary Shelley"]);
        assert!(authors.others.is_empty());
        assert_eq!(authors.golden_age[0].books.len(), 3);
    }

    #[test]
    fn search_then_save_then_enrich_flow() {
        use_test_env();
        let scan = scan_open(None);
        let found = scan_search(scan, "Kindred".to_string());
        assert_eq!(found.outcome, "navigate", "{}", found.message);
        assert!(scan_close(scan).ok);
        let transient = found.book.unwrap();
        assert_eq!(transient.tier, "basic");

        let opened = detail_open(
            transient.id.clone(),
            Some(transient.clone()),
            Some("fr".to_string()),
        );
        assert!(opened.ok && !opened.saved, "{}", opened.message);
        let handle = opened.handle;

        assert!(!detail_set_status(handle, "Read".to_string()).ok);
        let saved = detail_toggle_saved(handle);
        assert!(saved.ok && saved.saved, "{}", saved.message);
        assert!(detail_set_status(handle, "Reading".to_string()).ok);

        let enriched = detail_enrich(handle);
        assert!(enriched.ok, "{}", enriched.message);
        let book = enriched.book.unwrap();
        assert_eq!(book.tier, "deep");
        assert_eq!(book.status, "Reading");
        assert_eq!(enriched.phase, "idle_deep");

        let answer = detail_ask(handle, "Why?".to_string());
        assert!(answer.contains("Kindred"));

        let next = detail_open_recommendation(handle, 0);
        assert!(next.ok, "{}", next.message);
        assert!(next.book.unwrap().id.starts_with("rec-"));
        assert!(!detail_open_recommendation(handle, 99).ok);

        assert!(detail_close(handle).ok);
        assert!(!detail_enrich(handle).ok);
        assert!(library_remove(transient.id).ok);
    }

    #[test]
    fn scan_outcomes_are_reported_as_labels() {
        use_test_env();
        let scan = scan_open(None);
        let empty = scan_identify(scan, Vec::new());
        assert_eq!(empty.outcome, "not_found");
        assert!(!empty.message.is_empty());

        let blank = scan_search(scan, "   ".to_string());
        assert_eq!(blank.outcome, "ignored");

        let photo = scan_identify(scan, vec![0xff, 0xd8, 0xff]);
        assert_eq!(photo.outcome, "navigate");
        assert!(photo.book.unwrap().cover_url.starts_with("data:image/jpeg;base64,"));

        assert!(scan_close(scan).ok);
        assert_eq!(scan_search(scan, "Kindred".to_string()).outcome, "failed");
        assert!(!scan_close(scan).ok);
    }

    #[test]
    fn concurrent_searches_on_one_scanner_start_a_single_call() {
        let (app, mock) = slow_context(400);
        let handle = app.scan_open(None);
        let barrier = Barrier::new(2);

        let mut outcomes: Vec<String> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        app.scan_search(handle, "Kindred").outcome
                    })
                })
                .collect();
            workers.into_iter().map(|worker| worker.join().unwrap()).collect()
        });
        outcomes.sort();

        assert_eq!(outcomes, vec!["ignored", "navigate"]);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn concurrent_enrichment_on_one_detail_view_starts_a_single_call() {
        let (app, mock) = slow_context(400);
        let opened = app.detail_open("dune".to_string(), None, None);
        assert!(opened.saved);
        let handle = opened.handle;
        let barrier = Barrier::new(2);

        let responses = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        app.detail_enrich(handle)
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .collect::<Vec<_>>()
        });

        let (done, refused): (Vec<_>, Vec<_>) =
            responses.into_iter().partition(|response| response.ok);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].message, "Enriched and saved.");
        assert_eq!(refused.len(), 1);
        assert!(refused[0].busy);
        assert_eq!(refused[0].phase, "enriching");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn closing_a_detail_view_mid_enrichment_still_upgrades_the_saved_copy() {
        let (app, mock) = slow_context(400);
        let handle = app.detail_open("dune".to_string(), None, None).handle;
        let session = app.details.get(handle).unwrap();

        let response = std::thread::scope(|scope| {
            let worker = scope.spawn(|| app.detail_enrich(handle));
            while !session.is_busy() {
                std::thread::sleep(Duration::from_millis(5));
            }
            assert!(app.detail_close(handle).ok);
            worker.join().unwrap()
        });

        assert!(!response.ok);
        assert!(response.message.contains("view closed"), "{}", response.message);
        assert_eq!(mock.call_count(), 1);
        assert!(app.details.get(handle).is_none());
        let store = lock_library(&app.library);
        assert_eq!(store.get("dune").unwrap().completeness(), Completeness::Deep);
    }
}
