//! AI enrichment gateway.
//!
//! # Responsibility
//! - Define the boundary to the external generative model.
//! - Select the real or deterministic mock implementation at construction.
//!
//! # Invariants
//! - `Ok(None)` from identify/search means "ran fine, nothing found";
//!   `Err` means the call itself broke. Callers must keep them apart.
//! - Deep analysis never yields "nothing": it returns an overlay or fails.
//! - Question answering fails softly into a localized apology string.
//! - Mock and real implementations are indistinguishable to callers beyond
//!   content quality.

mod gemini;
mod mock;
pub mod prompt;

pub use gemini::GeminiGateway;
pub use mock::MockGateway;

use crate::config::CoreConfig;
use crate::i18n::Locale;
use crate::model::book::{Book, BookOverlay};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Enrichment call failure.
#[derive(Debug)]
pub enum GatewayError {
    /// Request could not be sent or the connection broke.
    Transport(String),
    /// Provider answered with a non-success status.
    Provider { status: u16, body: String },
    /// Provider answered but the payload did not match the requested schema.
    MalformedResponse(String),
    /// Client could not be constructed from configuration.
    Configuration(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "gateway transport error: {message}"),
            Self::Provider { status, body } => {
                write!(f, "gateway provider returned {status}: {body}")
            }
            Self::MalformedResponse(message) => {
                write!(f, "gateway response did not match schema: {message}")
            }
            Self::Configuration(message) => write!(f, "gateway configuration error: {message}"),
        }
    }
}

impl Error for GatewayError {}

/// Which implementation backs a gateway handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBackend {
    Gemini,
    Mock,
}

/// One still frame captured from the camera feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl CapturedImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Embedded image payload usable as a record cover.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Boundary to the external generative model.
#[async_trait]
pub trait EnrichmentGateway: Send + Sync {
    fn backend(&self) -> GatewayBackend;

    /// Identifies the book on a cover photo.
    ///
    /// On success the record has a fresh id, `ToRead` status and an empty
    /// cover; the caller fills the cover with the captured frame.
    async fn identify_from_image(
        &self,
        image: &CapturedImage,
        locale: Locale,
    ) -> GatewayResult<Option<Book>>;

    /// Finds the book best matching a free-text title/author guess.
    async fn search_by_query(&self, query: &str, locale: Locale) -> GatewayResult<Option<Book>>;

    /// Produces the deep-tier overlay for `book`, back-filling the basic
    /// tier in the same call when `book` is a stub.
    async fn generate_deep_analysis(
        &self,
        book: &Book,
        locale: Locale,
    ) -> GatewayResult<BookOverlay>;

    /// Answers a free-form question; never fails.
    async fn answer_question(
        &self,
        title: &str,
        author: &str,
        question: &str,
        locale: Locale,
    ) -> String;
}

/// Builds the gateway selected by `config`.
///
/// A usable credential selects Gemini; anything else selects the mock.
pub fn build_gateway(config: &CoreConfig) -> GatewayResult<Arc<dyn EnrichmentGateway>> {
    match config.usable_api_key() {
        Some(api_key) => {
            info!(
                "event=gateway_select module=gateway status=ok backend=gemini model={}",
                config.model
            );
            let gateway = GeminiGateway::new(api_key, &config.model, &config.base_url)?;
            Ok(Arc::new(gateway))
        }
        None => {
            info!(
                "event=gateway_select module=gateway status=ok backend=mock delay_ms={}",
                config.mock_delay.as_millis()
            );
            Ok(Arc::new(MockGateway::with_delay(config.mock_delay)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_gateway, CapturedImage, GatewayBackend};
    use crate::config::CoreConfig;

    #[test]
    fn missing_credential_selects_mock() {
        let gateway = build_gateway(&CoreConfig::default()).unwrap();
        assert_eq!(gateway.backend(), GatewayBackend::Mock);
    }

    #[test]
    fn usable_credential_selects_gemini() {
        let config = CoreConfig {
            api_key: Some("real-key".to_string()),
            ..CoreConfig::default()
        };
        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.backend(), GatewayBackend::Gemini);
    }

    #[test]
    fn data_url_embeds_mime_and_base64() {
        let image = CapturedImage::jpeg(vec![0xff, 0xd8, 0xff]);
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/");
    }
}
