use async_trait::async_trait;
use luma_core::catalog::SEARCH_COVER_URL;
use luma_core::{
    translate, Book, BookOverlay, CapturedImage, EnrichmentGateway, FrameSource,
    GatewayBackend, GatewayError, GatewayResult, Locale, MockGateway, ScanOutcome, ScanSession,
};
use std::sync::Arc;
use std::time::Duration;

struct StillFrame(Vec<u8>);

impl FrameSource for StillFrame {
    fn capture_frame(&self) -> Option<CapturedImage> {
        Some(CapturedImage::jpeg(self.0.clone()))
    }
}

struct DarkCamera;

impl FrameSource for DarkCamera {
    fn capture_frame(&self) -> Option<CapturedImage> {
        None
    }
}

struct FailingGateway;

#[async_trait]
impl EnrichmentGateway for FailingGateway {
    fn backend(&self) -> GatewayBackend {
        GatewayBackend::Gemini
    }

    async fn identify_from_image(
        &self,
        _image: &CapturedImage,
        _locale: Locale,
    ) -> GatewayResult<Option<Book>> {
        Err(GatewayError::MalformedResponse("not json".to_string()))
    }

    async fn search_by_query(&self, _query: &str, _locale: Locale) -> GatewayResult<Option<Book>> {
        Err(GatewayError::Transport("connection reset".to_string()))
    }

    async fn generate_deep_analysis(
        &self,
        _book: &Book,
        _locale: Locale,
    ) -> GatewayResult<BookOverlay> {
        Err(GatewayError::Transport("connection reset".to_string()))
    }

    async fn answer_question(
        &self,
        _title: &str,
        _author: &str,
        _question: &str,
        locale: Locale,
    ) -> String {
        translate("ai.apology", locale)
    }
}

fn instant_mock() -> Arc<MockGateway> {
    Arc::new(MockGateway::with_delay(Duration::ZERO))
}

#[tokio::test]
async fn identified_cover_navigates_with_the_captured_frame() {
    let session = ScanSession::open(instant_mock(), Locale::En);

    let outcome = session.capture(&StillFrame(vec![0xff, 0xd8, 0xff])).await;

    let ScanOutcome::Navigate(request) = outcome else {
        panic!("expected navigation");
    };
    let book = request.book.expect("transient record");
    assert_eq!(request.route_id, book.id);
    assert!(book.id.starts_with("scanned-"));
    assert_eq!(book.cover_url, "data:image/jpeg;base64,/9j/");
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn not_found_shows_an_error_and_does_not_navigate() {
    let session = ScanSession::open(instant_mock(), Locale::Fr);

    let outcome = session.capture(&StillFrame(Vec::new())).await;

    assert_eq!(outcome, ScanOutcome::NotFound);
    assert_eq!(
        session.error(),
        Some(translate("scan.identify_error", Locale::Fr))
    );
}

#[tokio::test]
async fn gateway_failure_is_distinct_from_not_found() {
    let session = ScanSession::open(Arc::new(FailingGateway), Locale::En);

    assert_eq!(
        session.capture(&StillFrame(vec![1])).await,
        ScanOutcome::Failed
    );
    assert_eq!(session.error(), Some(translate("scan.error", Locale::En)));

    assert_eq!(session.search("Dune").await, ScanOutcome::Failed);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn missing_frame_fails_without_calling_the_gateway() {
    let mock = instant_mock();
    let session = ScanSession::open(mock.clone(), Locale::En);

    assert_eq!(session.capture(&DarkCamera).await, ScanOutcome::Failed);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn search_uses_the_generic_cover_and_ignores_blank_queries() {
    let mock = instant_mock();
    let session = ScanSession::open(mock.clone(), Locale::En);

    assert_eq!(session.search("   ").await, ScanOutcome::Ignored);
    assert_eq!(mock.call_count(), 0);

    let ScanOutcome::Navigate(request) = session.search("Dune Frank Herbert").await else {
        panic!("expected navigation");
    };
    let book = request.book.unwrap();
    assert!(book.id.starts_with("search-"));
    assert_eq!(book.cover_url, SEARCH_COVER_URL);

    assert_eq!(session.search("???").await, ScanOutcome::NotFound);
}

#[tokio::test(start_paused = true)]
async fn reentrant_capture_is_ignored() {
    let mock = Arc::new(MockGateway::with_delay(Duration::from_millis(1500)));
    let session = ScanSession::open(mock.clone(), Locale::En);
    let camera = StillFrame(vec![7; 16]);

    let (first, second, search, progress) = tokio::join!(
        session.capture(&camera),
        session.capture(&camera),
        session.search("Dune"),
        async { session.progress_key() }
    );

    assert!(matches!(first, ScanOutcome::Navigate(_)));
    assert_eq!(second, ScanOutcome::Ignored);
    assert_eq!(search, ScanOutcome::Ignored);
    assert_eq!(progress, Some("scan.identifying"));
    assert_eq!(mock.call_count(), 1);
    assert_eq!(session.progress_key(), None);
}

#[tokio::test(start_paused = true)]
async fn result_after_close_is_dropped() {
    let session = ScanSession::open(
        Arc::new(MockGateway::with_delay(Duration::from_secs(1))),
        Locale::En,
    );

    let frame = StillFrame(Vec::new());
    let (outcome, ()) = tokio::join!(session.capture(&frame), async {
        session.close()
    });

    assert_eq!(outcome, ScanOutcome::Ignored);
    assert_eq!(session.error(), None);
    assert_eq!(session.search("Dune").await, ScanOutcome::Ignored);
}

#[tokio::test(start_paused = true)]
async fn scan_errors_auto_clear() {
    let session = ScanSession::open(instant_mock(), Locale::En);
    session.search("...").await;
    assert!(session.error().is_some());

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(session.error(), None);
}
