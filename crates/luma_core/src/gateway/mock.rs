//! Deterministic offline gateway.
//!
//! Used whenever no usable credential is configured. Every call waits for
//! the configured delay and returns schema-complete content.

use super::prompt::{DeepAnalysisPlan, SCANNED_ID_PREFIX, SEARCH_ID_PREFIX};
use super::{CapturedImage, EnrichmentGateway, GatewayBackend, GatewayResult};
use crate::config::DEFAULT_MOCK_DELAY;
use crate::i18n::Locale;
use crate::model::book::{new_record_id, Book, BookOverlay, BookRef};
use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Offline gateway returning fixed, localized content.
pub struct MockGateway {
    delay: Duration,
    calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::with_delay(DEFAULT_MOCK_DELAY)
    }
}

impl MockGateway {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls started on this instance.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self, op: &'static str) {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "event=gateway_call module=gateway status=start backend=mock op={op} call={call} delay_ms={}",
            self.delay.as_millis()
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn localized(locale: Locale, en: &str, fr: &str) -> String {
    match locale {
        Locale::En => en.to_string(),
        Locale::Fr => fr.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[async_trait]
impl EnrichmentGateway for MockGateway {
    fn backend(&self) -> GatewayBackend {
        GatewayBackend::Mock
    }

    async fn identify_from_image(
        &self,
        image: &CapturedImage,
        locale: Locale,
    ) -> GatewayResult<Option<Book>> {
        self.simulate("identify").await;
        if image.is_empty() {
            return Ok(None);
        }

        let mut book = Book::stub(
            new_record_id(SCANNED_ID_PREFIX),
            "Mock Detected Book",
            "Unknown Author",
        );
        book.apply_overlay(&BookOverlay {
            summary: Some(localized(
                locale,
                "This is a simulated scan result because no API Key was provided.",
                "Ceci est une simulation car aucune clé API n'a été fournie.",
            )),
            category: Some("Simulation".to_string()),
            main_ideas: Some(strings(&[
                "Please add a valid API Key",
                "Restart the app",
                "Try again",
            ])),
            recommendations: Some(vec![
                BookRef::new("Similar Mock Book 1", "Author A"),
                BookRef::new("Similar Mock Book 2", "Author B"),
                BookRef::new("Similar Mock Book 3", "Author C"),
            ]),
            ..BookOverlay::default()
        });
        Ok(Some(book))
    }

    async fn search_by_query(&self, query: &str, locale: Locale) -> GatewayResult<Option<Book>> {
        self.simulate("search").await;
        let query = query.trim();
        if !query.chars().any(char::is_alphanumeric) {
            return Ok(None);
        }

        let mut book = Book::stub(new_record_id(SEARCH_ID_PREFIX), query, "Mock Author");
        book.apply_overlay(&BookOverlay {
            summary: Some(localized(
                locale,
                "Mock result for text search.",
                "Résultat de simulation pour recherche textuelle.",
            )),
            category: Some("Simulation".to_string()),
            main_ideas: Some(strings(&["Mock idea 1", "Mock idea 2", "Mock idea 3"])),
            recommendations: Some(vec![
                BookRef::new("Mock Recommendation 1", "Author A"),
                BookRef::new("Mock Recommendation 2", "Author B"),
                BookRef::new("Mock Recommendation 3", "Author C"),
            ]),
            ..BookOverlay::default()
        });
        Ok(Some(book))
    }

    async fn generate_deep_analysis(
        &self,
        book: &Book,
        locale: Locale,
    ) -> GatewayResult<BookOverlay> {
        self.simulate("deep_analysis").await;
        let plan = DeepAnalysisPlan::for_book(book);

        let mut overlay = BookOverlay {
            influences: Some(strings(&["Influence A", "Influence B"])),
            historical_context: Some(localized(
                locale,
                "Mock historical context.",
                "Contexte historique simulé.",
            )),
            detailed_bio: Some(localized(
                locale,
                "Mock detailed bio.",
                "Biographie détaillée simulée.",
            )),
            ..BookOverlay::default()
        };
        if plan.include_basic {
            overlay.summary = Some(localized(
                locale,
                "Mock summary generated.",
                "Résumé simulé généré.",
            ));
            overlay.category = Some("Mock Category".to_string());
            overlay.main_ideas = Some(strings(&["Mock Idea 1", "Mock Idea 2", "Mock Idea 3"]));
        }
        Ok(overlay)
    }

    async fn answer_question(
        &self,
        title: &str,
        author: &str,
        _question: &str,
        locale: Locale,
    ) -> String {
        self.simulate("answer").await;
        match locale {
            Locale::En => format!(
                "(Mock AI Response) Here is some insight about {title} by {author}. \
                 The book explores themes of resilience and humanity."
            ),
            Locale::Fr => format!(
                "(Réponse IA simulée) Voici un éclairage sur {title} de {author}. \
                 Le livre explore les thèmes de la résilience et de l'humanité."
            ),
        }
    }
}
