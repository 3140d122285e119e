//! Gemini `generateContent` client.
//!
//! Requests ask for `application/json` with a response schema; the JSON
//! comes back as candidate text and is decoded by [`super::prompt`] types.

use super::prompt::{
    book_sheet_schema, deep_analysis_prompt, deep_analysis_schema, identify_prompt,
    question_prompt, search_prompt, BookSheet, DeepAnalysisPlan, SCANNED_ID_PREFIX,
    SEARCH_ID_PREFIX,
};
use super::{CapturedImage, EnrichmentGateway, GatewayBackend, GatewayError, GatewayResult};
use crate::i18n::{translate, Locale};
use crate::model::book::{Book, BookOverlay};
use async_trait::async_trait;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("luma-core/", env!("CARGO_PKG_VERSION"));

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gateway backed by the Gemini REST API.
pub struct GeminiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiGateway {
    /// Creates a client for `model` under `base_url`.
    pub fn new(api_key: &str, model: &str, base_url: &str) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| GatewayError::Configuration(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            api_key: api_key.to_string(),
        })
    }

    async fn generate(&self, op: &'static str, body: Value) -> GatewayResult<String> {
        let started_at = Instant::now();
        info!("event=gateway_call module=gateway status=start backend=gemini op={op}");

        let result = self.send(body).await;
        match &result {
            Ok(text) => info!(
                "event=gateway_call module=gateway status=ok backend=gemini op={op} duration_ms={} response_chars={}",
                started_at.elapsed().as_millis(),
                text.chars().count()
            ),
            Err(err) => error!(
                "event=gateway_call module=gateway status=error backend=gemini op={op} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    async fn send(&self, body: Value) -> GatewayResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
        Ok(candidate_text(&parsed))
    }
}

#[async_trait]
impl EnrichmentGateway for GeminiGateway {
    fn backend(&self) -> GatewayBackend {
        GatewayBackend::Gemini
    }

    async fn identify_from_image(
        &self,
        image: &CapturedImage,
        locale: Locale,
    ) -> GatewayResult<Option<Book>> {
        let parts = vec![
            json!({ "inlineData": { "mimeType": image.mime_type, "data": image.to_base64() } }),
            json!({ "text": identify_prompt(locale) }),
        ];
        let text = self
            .generate("identify", request_body(parts, Some(book_sheet_schema())))
            .await?;
        parse_book_sheet(&text, SCANNED_ID_PREFIX)
    }

    async fn search_by_query(&self, query: &str, locale: Locale) -> GatewayResult<Option<Book>> {
        let parts = vec![json!({ "text": search_prompt(query, locale) })];
        let text = self
            .generate("search", request_body(parts, Some(book_sheet_schema())))
            .await?;
        parse_book_sheet(&text, SEARCH_ID_PREFIX)
    }

    async fn generate_deep_analysis(
        &self,
        book: &Book,
        locale: Locale,
    ) -> GatewayResult<BookOverlay> {
        let plan = DeepAnalysisPlan::for_book(book);
        let parts = vec![json!({ "text": deep_analysis_prompt(book, plan, locale) })];
        let text = self
            .generate(
                "deep_analysis",
                request_body(parts, Some(deep_analysis_schema(plan))),
            )
            .await?;
        parse_overlay(&text, plan)
    }

    async fn answer_question(
        &self,
        title: &str,
        author: &str,
        question: &str,
        locale: Locale,
    ) -> String {
        let parts = vec![json!({ "text": question_prompt(title, author, question, locale) })];
        match self.generate("answer", request_body(parts, None)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => translate("ai.no_answer", locale),
            Err(_) => translate("ai.apology", locale),
        }
    }
}

/// Builds a `generateContent` body; a schema switches on JSON output.
fn request_body(parts: Vec<Value>, schema: Option<Value>) -> Value {
    let mut body = json!({ "contents": [{ "role": "user", "parts": parts }] });
    if let Some(schema) = schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

fn candidate_text(response: &GenerateResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Decodes identify/search output; empty text or JSON `null` is "not found".
fn parse_book_sheet(text: &str, id_prefix: &str) -> GatewayResult<Option<Book>> {
    let json_text = strip_code_fence(text);
    if json_text.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(json_text)
        .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
    if value.is_null() {
        return Ok(None);
    }
    let sheet: BookSheet = serde_json::from_value(value)
        .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
    Ok(sheet.into_book(id_prefix))
}

/// Decodes deep-analysis output and enforces the plan's required fields.
fn parse_overlay(text: &str, plan: DeepAnalysisPlan) -> GatewayResult<BookOverlay> {
    let json_text = strip_code_fence(text);
    if json_text.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "empty deep analysis response".to_string(),
        ));
    }
    let overlay: BookOverlay = serde_json::from_str(json_text)
        .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
    let overlay = plan.restrict(overlay);
    if !plan.is_satisfied_by(&overlay) {
        return Err(GatewayError::MalformedResponse(format!(
            "deep analysis is missing required fields {:?}",
            plan.required_fields()
        )));
    }
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::{
        candidate_text, parse_book_sheet, parse_overlay, request_body, strip_code_fence,
        GenerateResponse,
    };
    use crate::gateway::prompt::DeepAnalysisPlan;
    use crate::gateway::GatewayError;
    use serde_json::json;

    #[test]
    fn candidate_text_joins_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(candidate_text(&response), "{\"a\":1}");

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(candidate_text(&empty), "");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        assert_eq!(strip_code_fence("```json\n{\"x\":1}\n```"), "{\"x\":1}");
        assert_eq!(strip_code_fence("  null "), "null");
    }

    #[test]
    fn null_and_empty_sheets_are_not_found() {
        assert!(parse_book_sheet("null", "scanned").unwrap().is_none());
        assert!(parse_book_sheet("", "scanned").unwrap().is_none());
    }

    #[test]
    fn garbage_sheet_is_a_failure_not_a_miss() {
        let err = parse_book_sheet("I see a cat.", "scanned").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn overlay_missing_deep_fields_is_rejected() {
        let plan = DeepAnalysisPlan {
            include_basic: false,
        };
        let err = parse_overlay(r#"{"influences":["x"]}"#, plan).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));

        let overlay = parse_overlay(
            r#"{"influences":["x"],"historicalContext":"era","detailedBio":"bio","summary":"s"}"#,
            plan,
        )
        .unwrap();
        assert!(overlay.summary.is_none());
        assert_eq!(overlay.detailed_bio.as_deref(), Some("bio"));
    }

    #[test]
    fn request_body_only_sets_json_mode_with_schema() {
        let plain = request_body(vec![json!({ "text": "hi" })], None);
        assert!(plain.get("generationConfig").is_none());

        let structured = request_body(vec![json!({ "text": "hi" })], Some(json!({"type": "OBJECT"})));
        assert_eq!(
            structured["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(structured["contents"][0]["parts"][0]["text"], "hi");
    }
}
