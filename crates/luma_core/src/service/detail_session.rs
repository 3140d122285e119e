//! Detail view session: working record, enrichment and Q&A.
//!
//! # Responsibility
//! - Resolve the working record for the current route.
//! - Run deep enrichment and question answering through the gateway.
//! - Mirror saved/unsaved and status changes into the shared library.
//!
//! # Invariants
//! - One gateway call in flight per session; enrich and ask share the flag.
//! - The shared library lock is never held across an `.await`.
//! - A saved record that gets enriched is upgraded in the library even when
//!   the view closed meanwhile; the view itself is only touched while active
//!   and still showing the same record.
//! - Enrichment failure leaves both the view and the library unchanged.

use super::library_store::{lock_library, SharedLibrary};
use super::record_resolver::{resolve_record, RecordSource};
use super::session_support::{
    visible_notice, Activity, SessionFlags, TransientNotice, NOTICE_TTL,
};
use crate::catalog::RECOMMENDATION_COVER_URL;
use crate::gateway::{EnrichmentGateway, GatewayError};
use crate::i18n::{translate, Locale};
use crate::model::book::{new_record_id, Book, BookId, Completeness, ReadingStatus};
use crate::model::NavigationRequest;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const RECOMMENDATION_ID_PREFIX: &str = "rec";

/// Detail session error.
#[derive(Debug)]
pub enum DetailError {
    /// Status can only change on a saved record.
    NotSaved(BookId),
    Gateway(GatewayError),
}

impl Display for DetailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSaved(id) => write!(f, "book `{id}` is not in the library"),
            Self::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DetailError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotSaved(_) => None,
            Self::Gateway(err) => Some(err),
        }
    }
}

impl From<GatewayError> for DetailError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

/// Display phase of the enrichment control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    IdleStub,
    IdleBasic,
    IdleDeep,
    Enriching,
}

/// Enrichment action offered for the working record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOffer {
    /// Stub record: one call fills basic and deep tiers.
    BasicSheet,
    /// Basic record: one call fills the deep tier.
    FullAnalysis,
}

impl EnrichmentOffer {
    pub fn label_key(self) -> &'static str {
        match self {
            Self::BasicSheet => "detail.generate_basic",
            Self::FullAnalysis => "detail.generate_full",
        }
    }

    pub fn progress_key(self) -> &'static str {
        match self {
            Self::BasicSheet => "detail.generating_basic",
            Self::FullAnalysis => "detail.generating",
        }
    }
}

/// Result of one enrichment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The view now shows `book`; `persisted` tells whether the library
    /// copy was upgraded too.
    Applied { book: Book, persisted: bool },
    /// Another gateway call is in flight; nothing was started.
    Busy,
    /// Record is already deep; nothing was started.
    AlreadyComplete,
    /// The view closed or moved to another record before the call finished.
    Detached { persisted: bool },
}

/// Result of toggling the saved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    Added,
    Removed,
}

#[derive(Debug)]
struct DetailState {
    route_id: BookId,
    navigation: Option<Book>,
    working: Book,
    source: RecordSource,
    answer: Option<String>,
    toast: Option<TransientNotice>,
}

/// State of one mounted detail view.
pub struct DetailSession {
    library: SharedLibrary,
    gateway: Arc<dyn EnrichmentGateway>,
    locale: Locale,
    flags: SessionFlags,
    state: Mutex<DetailState>,
}

impl DetailSession {
    /// Mounts a detail view for `request`.
    pub fn open(
        library: SharedLibrary,
        gateway: Arc<dyn EnrichmentGateway>,
        locale: Locale,
        request: NavigationRequest,
    ) -> Self {
        let resolved = {
            let store = lock_library(&library);
            resolve_record(&request.route_id, store.books(), request.book.as_ref())
        };
        info!(
            "event=detail_open module=detail status=ok source={:?} tier={:?}",
            resolved.source,
            resolved.book.completeness()
        );

        Self {
            library,
            gateway,
            locale,
            flags: SessionFlags::new(),
            state: Mutex::new(DetailState {
                route_id: request.route_id,
                navigation: request.book,
                working: resolved.book,
                source: resolved.source,
                answer: None,
                toast: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches the view to another route and drops the previous answer.
    pub fn navigate(&self, request: NavigationRequest) {
        let resolved = {
            let store = lock_library(&self.library);
            resolve_record(&request.route_id, store.books(), request.book.as_ref())
        };
        let mut state = self.state();
        state.route_id = request.route_id;
        state.navigation = request.book;
        state.working = resolved.book;
        state.source = resolved.source;
        state.answer = None;
    }

    /// Re-resolves the working record after the library changed.
    ///
    /// The library copy of the shown record always wins. Otherwise the shown
    /// record is kept, so unsaved enrichment survives a refresh.
    pub fn refresh(&self) {
        let store = lock_library(&self.library);
        let mut state = self.state();
        refresh_locked(&mut state, store.books());
    }

    pub fn working(&self) -> Book {
        self.state().working.clone()
    }

    pub fn source(&self) -> RecordSource {
        self.state().source
    }

    pub fn phase(&self) -> DetailPhase {
        if self.flags.activity() == Some(Activity::Enriching) {
            return DetailPhase::Enriching;
        }
        match self.state().working.completeness() {
            Completeness::Stub => DetailPhase::IdleStub,
            Completeness::Basic => DetailPhase::IdleBasic,
            Completeness::Deep => DetailPhase::IdleDeep,
        }
    }

    /// Enrichment action to offer; `None` once the record is deep.
    pub fn offered_enrichment(&self) -> Option<EnrichmentOffer> {
        offer_for(&self.state().working)
    }

    pub fn is_saved(&self) -> bool {
        let id = self.state().working.id.clone();
        lock_library(&self.library).contains(&id)
    }

    pub fn is_busy(&self) -> bool {
        self.flags.is_busy()
    }

    pub fn is_active(&self) -> bool {
        self.flags.is_active()
    }

    /// Runs deep enrichment for the working record.
    ///
    /// # Errors
    /// - `DetailError::Gateway` when the call fails; nothing changes.
    pub async fn enrich(&self) -> Result<EnrichOutcome, DetailError> {
        if !self.flags.is_active() {
            return Ok(EnrichOutcome::Detached { persisted: false });
        }
        let Some(_guard) = self.flags.try_begin(Activity::Enriching) else {
            return Ok(EnrichOutcome::Busy);
        };

        let snapshot = self.working();
        let Some(offer) = offer_for(&snapshot) else {
            return Ok(EnrichOutcome::AlreadyComplete);
        };
        info!(
            "event=detail_enrich module=detail status=start offer={:?}",
            offer
        );

        let overlay = match self
            .gateway
            .generate_deep_analysis(&snapshot, self.locale)
            .await
        {
            Ok(overlay) => overlay,
            Err(err) => {
                error!("event=detail_enrich module=detail status=error error={err}");
                return Err(DetailError::Gateway(err));
            }
        };

        let mut store = lock_library(&self.library);
        let stored = store.apply_overlay(&snapshot.id, &overlay);
        let persisted = stored.is_some();

        if !self.flags.is_active() {
            info!("event=detail_enrich module=detail status=detached persisted={persisted}");
            return Ok(EnrichOutcome::Detached { persisted });
        }

        let mut state = self.state();
        drop(store);
        if state.working.id != snapshot.id {
            warn!("event=detail_enrich module=detail status=detached reason=record_changed");
            return Ok(EnrichOutcome::Detached { persisted });
        }

        match stored {
            Some(book) => {
                state.working = book;
                state.source = RecordSource::Library;
            }
            None => state.working.apply_overlay(&overlay),
        }
        info!(
            "event=detail_enrich module=detail status=ok tier={:?} persisted={persisted}",
            state.working.completeness()
        );
        Ok(EnrichOutcome::Applied {
            book: state.working.clone(),
            persisted,
        })
    }

    /// Adds the working record to the library, or removes it.
    pub fn toggle_saved(&self) -> SaveToggle {
        let mut store = lock_library(&self.library);
        let mut state = self.state();
        let id = state.working.id.clone();

        let toggle = if store.contains(&id) {
            store.remove(&id);
            SaveToggle::Removed
        } else {
            store.add(state.working.clone());
            SaveToggle::Added
        };

        let key = match toggle {
            SaveToggle::Added => "detail.toast_added",
            SaveToggle::Removed => "detail.toast_removed",
        };
        state.toast = Some(TransientNotice::new(translate(key, self.locale), NOTICE_TTL));
        refresh_locked(&mut state, store.books());
        info!("event=detail_toggle_saved module=detail status=ok result={:?}", toggle);
        toggle
    }

    /// Changes the reading status of the saved working record.
    ///
    /// # Errors
    /// - `DetailError::NotSaved` when the record is not in the library.
    pub fn set_status(&self, status: ReadingStatus) -> Result<(), DetailError> {
        let mut store = lock_library(&self.library);
        let mut state = self.state();
        let id = state.working.id.clone();
        if !store.update_status(&id, status) {
            return Err(DetailError::NotSaved(id));
        }
        refresh_locked(&mut state, store.books());
        Ok(())
    }

    /// Asks a free-form question about the working record.
    ///
    /// Returns `None` for blank questions, while another call is in flight,
    /// or when the view moved on before the answer arrived.
    pub async fn ask(&self, question: &str) -> Option<String> {
        let question = question.trim();
        if question.is_empty() || !self.flags.is_active() {
            return None;
        }
        let _guard = self.flags.try_begin(Activity::Asking)?;

        let (id, title, author) = {
            let state = self.state();
            (
                state.working.id.clone(),
                state.working.title.clone(),
                state.working.author.clone(),
            )
        };
        let answer = self
            .gateway
            .answer_question(&title, &author, question, self.locale)
            .await;

        if !self.flags.is_active() {
            return None;
        }
        let mut state = self.state();
        if state.working.id != id {
            return None;
        }
        state.answer = Some(answer.clone());
        Some(answer)
    }

    pub fn answer(&self) -> Option<String> {
        self.state().answer.clone()
    }

    /// Builds navigation to a fresh stub for the recommendation at `index`.
    pub fn recommendation(&self, index: usize) -> Option<NavigationRequest> {
        let state = self.state();
        let reference = state.working.recommendations.as_ref()?.get(index)?;
        let mut stub = Book::stub(
            new_record_id(RECOMMENDATION_ID_PREFIX),
            reference.title.clone(),
            reference.author.clone(),
        );
        stub.cover_url = RECOMMENDATION_COVER_URL.to_string();
        Some(NavigationRequest::with_transient(stub))
    }

    /// Visible toast text, if any.
    pub fn toast(&self) -> Option<String> {
        visible_notice(&mut self.state().toast)
    }

    /// Unmounts the view; pending calls finish without touching it.
    pub fn close(&self) {
        self.flags.close();
        info!("event=detail_close module=detail status=ok");
    }
}

fn offer_for(book: &Book) -> Option<EnrichmentOffer> {
    match book.completeness() {
        Completeness::Stub => Some(EnrichmentOffer::BasicSheet),
        Completeness::Basic => Some(EnrichmentOffer::FullAnalysis),
        Completeness::Deep => None,
    }
}

fn refresh_locked(state: &mut DetailState, library: &[Book]) {
    if let Some(saved) = library.iter().find(|book| book.id == state.working.id) {
        state.working = saved.clone();
        state.source = RecordSource::Library;
        return;
    }
    let resolved = resolve_record(&state.route_id, library, state.navigation.as_ref());
    if resolved.source == RecordSource::Library {
        state.working = resolved.book;
        state.source = resolved.source;
    } else if state.source == RecordSource::Library {
        state.source = resolved.source;
    }
}
