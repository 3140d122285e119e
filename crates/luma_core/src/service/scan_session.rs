//! Scanner view session: camera identify and text search.
//!
//! # Responsibility
//! - Drive one identify or search call at a time through the gateway.
//! - Turn a hit into a navigation request carrying a transient record.
//!
//! # Invariants
//! - Never writes to the library; promotion is a detail view action.
//! - Never navigates on a miss or a failure; both raise a transient error.
//! - Re-entrant triggers while a call is in flight are ignored.

use super::session_support::{
    visible_notice, Activity, SessionFlags, TransientNotice, NOTICE_TTL,
};
use crate::catalog::SEARCH_COVER_URL;
use crate::gateway::{CapturedImage, EnrichmentGateway, GatewayResult};
use crate::i18n::{translate, Locale};
use crate::model::book::Book;
use crate::model::NavigationRequest;
use log::{error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Acquisition mode of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Camera,
    Search,
}

impl ScanMode {
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Camera => "scan.mode_camera",
            Self::Search => "scan.mode_search",
        }
    }
}

/// Result of one scan trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Hand off to the detail view.
    Navigate(NavigationRequest),
    /// Gateway ran fine but identified nothing.
    NotFound,
    /// Frame capture or the gateway call failed.
    Failed,
    /// Trigger dropped: blank query, call in flight, or session closed.
    Ignored,
}

/// Source of still frames, typically the live camera feed.
pub trait FrameSource {
    /// Grabs the current frame; `None` when no frame is available.
    fn capture_frame(&self) -> Option<CapturedImage>;
}

#[derive(Debug, Default)]
struct ScanState {
    mode: ScanMode,
    error: Option<TransientNotice>,
}

/// State of one mounted scanner view.
pub struct ScanSession {
    gateway: Arc<dyn EnrichmentGateway>,
    locale: Locale,
    flags: SessionFlags,
    state: Mutex<ScanState>,
}

impl ScanSession {
    pub fn open(gateway: Arc<dyn EnrichmentGateway>, locale: Locale) -> Self {
        Self {
            gateway,
            locale,
            flags: SessionFlags::new(),
            state: Mutex::new(ScanState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> ScanMode {
        self.state().mode
    }

    pub fn set_mode(&self, mode: ScanMode) {
        self.state().mode = mode;
    }

    /// In-flight call, for the progress label.
    pub fn progress_key(&self) -> Option<&'static str> {
        match self.flags.activity()? {
            Activity::Identifying => Some("scan.identifying"),
            Activity::Searching => Some("scan.searching"),
            Activity::Enriching | Activity::Asking => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.flags.is_busy()
    }

    /// Captures one frame and identifies the book on it.
    pub async fn capture(&self, camera: &dyn FrameSource) -> ScanOutcome {
        if !self.flags.is_active() {
            return ScanOutcome::Ignored;
        }
        let Some(_guard) = self.flags.try_begin(Activity::Identifying) else {
            return ScanOutcome::Ignored;
        };

        let Some(frame) = camera.capture_frame() else {
            error!("event=scan_capture module=scan status=error error_code=no_frame");
            self.raise("scan.error");
            return ScanOutcome::Failed;
        };
        info!(
            "event=scan_capture module=scan status=start frame_bytes={}",
            frame.bytes.len()
        );

        let result = self.gateway.identify_from_image(&frame, self.locale).await;
        self.finish("identify", result, frame.to_data_url())
    }

    /// Searches for a book by free-text title/author guess.
    pub async fn search(&self, query: &str) -> ScanOutcome {
        let query = query.trim();
        if query.is_empty() || !self.flags.is_active() {
            return ScanOutcome::Ignored;
        }
        let Some(_guard) = self.flags.try_begin(Activity::Searching) else {
            return ScanOutcome::Ignored;
        };
        info!(
            "event=scan_search module=scan status=start query_chars={}",
            query.chars().count()
        );

        let result = self.gateway.search_by_query(query, self.locale).await;
        self.finish("search", result, SEARCH_COVER_URL.to_string())
    }

    fn finish(
        &self,
        op: &'static str,
        result: GatewayResult<Option<Book>>,
        cover_url: String,
    ) -> ScanOutcome {
        if !self.flags.is_active() {
            info!("event=scan_{op} module=scan status=detached");
            return ScanOutcome::Ignored;
        }
        match result {
            Ok(Some(mut book)) => {
                book.cover_url = cover_url;
                info!("event=scan_{op} module=scan status=ok");
                ScanOutcome::Navigate(NavigationRequest::with_transient(book))
            }
            Ok(None) => {
                info!("event=scan_{op} module=scan status=not_found");
                self.raise("scan.identify_error");
                ScanOutcome::NotFound
            }
            Err(err) => {
                error!("event=scan_{op} module=scan status=error error={err}");
                self.raise("scan.error");
                ScanOutcome::Failed
            }
        }
    }

    /// Reports that the camera feed could not be opened.
    pub fn report_camera_unavailable(&self) {
        error!("event=scan_camera module=scan status=error error_code=camera_unavailable");
        self.raise("scan.permission");
    }

    fn raise(&self, key: &str) {
        let notice = TransientNotice::new(translate(key, self.locale), NOTICE_TTL);
        self.state().error = Some(notice);
    }

    /// Visible error text, if any.
    pub fn error(&self) -> Option<String> {
        visible_notice(&mut self.state().error)
    }

    /// Unmounts the view; pending calls finish without touching it.
    pub fn close(&self) {
        self.flags.close();
    }
}
