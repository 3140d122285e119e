//! Prompt and response-schema shaping for enrichment requests.
//!
//! # Responsibility
//! - Build the instruction text and JSON response schema of each call.
//! - Decode provider JSON into records and overlays.
//!
//! # Invariants
//! - Title and author stay in their original language; every other generated
//!   field follows the requested locale.
//! - A deep-analysis overlay only carries the fields its request asked for.

use crate::i18n::Locale;
use crate::model::book::{new_record_id, Book, BookOverlay, BookRef};
use serde::Deserialize;
use serde_json::{json, Value};

/// Id prefix of records identified from a camera frame.
pub const SCANNED_ID_PREFIX: &str = "scanned";
/// Id prefix of records found by text search.
pub const SEARCH_ID_PREFIX: &str = "search";

/// Which tiers a deep-analysis call requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepAnalysisPlan {
    /// Back-fill summary/category/main ideas in the same call.
    pub include_basic: bool,
}

impl DeepAnalysisPlan {
    /// Basic fields are requested only when the record is still a stub.
    pub fn for_book(book: &Book) -> Self {
        Self {
            include_basic: book.is_stub(),
        }
    }

    /// Field names the response schema marks as required.
    pub fn required_fields(self) -> Vec<&'static str> {
        let mut fields = vec!["influences", "historicalContext", "detailedBio"];
        if self.include_basic {
            fields.extend(["summary", "category", "mainIdeas"]);
        }
        fields
    }

    /// Drops fields this plan did not request.
    pub fn restrict(self, overlay: BookOverlay) -> BookOverlay {
        let mut restricted = BookOverlay {
            influences: overlay.influences,
            historical_context: overlay.historical_context,
            detailed_bio: overlay.detailed_bio,
            ..BookOverlay::default()
        };
        if self.include_basic {
            restricted.summary = overlay.summary;
            restricted.category = overlay.category;
            restricted.main_ideas = overlay.main_ideas;
        }
        restricted
    }

    /// Whether `overlay` carries every required field with content.
    pub fn is_satisfied_by(self, overlay: &BookOverlay) -> bool {
        let text = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        let list = |value: &Option<Vec<String>>| value.as_ref().is_some_and(|v| !v.is_empty());

        let deep = list(&overlay.influences)
            && text(&overlay.historical_context)
            && text(&overlay.detailed_bio);
        let basic = !self.include_basic
            || (text(&overlay.summary) && text(&overlay.category) && list(&overlay.main_ideas));
        deep && basic
    }
}

fn sheet_language_instruction(locale: Locale) -> &'static str {
    match locale {
        Locale::Fr => "Provide the summary, category, mainIdeas and recommendations IN FRENCH. Keep title and author in original language.",
        Locale::En => "Provide the summary, category, mainIdeas and recommendations IN ENGLISH.",
    }
}

/// Instruction sent alongside a captured cover image.
pub fn identify_prompt(locale: Locale) -> String {
    format!(
        "Identify the book in this image. Return a JSON object with:\n\
         - title\n\
         - author\n\
         - a brief summary (max 30 words)\n\
         - a guess at the philosophy or genre (category)\n\
         - 3 short bullet points of main ideas\n\
         - 'recommendations': an array of 3 objects {{title, author}} of books similar to this one.\n\
         {}\n\
         If no book is clearly visible, return null.",
        sheet_language_instruction(locale)
    )
}

/// Instruction for a free-text title/author guess.
pub fn search_prompt(query: &str, locale: Locale) -> String {
    format!(
        "Find the book best matching this query: \"{}\".\n\
         Return a JSON object with:\n\
         - title (correct full title)\n\
         - author\n\
         - a brief summary (max 30 words)\n\
         - a guess at the philosophy or genre (category)\n\
         - 3 short bullet points of main ideas\n\
         - 'recommendations': an array of 3 objects {{title, author}} of books similar to this one.\n\
         {}\n\
         If the query is nonsense, return null.",
        query.trim(),
        sheet_language_instruction(locale)
    )
}

/// Instruction for the deep literary analysis of `book`.
pub fn deep_analysis_prompt(book: &Book, plan: DeepAnalysisPlan, locale: Locale) -> String {
    let mut lines = vec![
        format!(
            "Perform a deep literary analysis of the book \"{}\" by \"{}\".",
            book.title, book.author
        ),
        "Return a JSON object with:".to_string(),
    ];
    if plan.include_basic {
        lines.push("- 'summary': a concise summary (max 50 words).".to_string());
        lines.push("- 'category': genre or philosophy.".to_string());
        lines.push("- 'mainIdeas': 3 bullet points.".to_string());
    }
    lines.push(
        "- 'influences': an array of 3-4 specific influences (people, events, or books)."
            .to_string(),
    );
    lines.push(
        "- 'historicalContext': a paragraph (approx 50 words) describing the era it was written in."
            .to_string(),
    );
    lines.push(
        "- 'detailedBio': a short biography of the author (approx 50 words) focusing on their style."
            .to_string(),
    );
    lines.push(
        match locale {
            Locale::Fr => "Answer IN FRENCH.",
            Locale::En => "Answer IN ENGLISH.",
        }
        .to_string(),
    );
    lines.join("\n")
}

/// Instruction for a free-form question about one book.
pub fn question_prompt(title: &str, author: &str, question: &str, locale: Locale) -> String {
    format!(
        "You are a helpful literary assistant.\n\
         The user is asking about the book \"{title}\" by \"{author}\".\n\
         Question: {}\n\
         {}\n\
         Keep the answer concise (under 100 words) and engaging.",
        question.trim(),
        match locale {
            Locale::Fr => "Answer in French.",
            Locale::En => "Answer in English.",
        }
    )
}

fn string_schema() -> Value {
    json!({ "type": "STRING" })
}

fn string_list_schema() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Response schema shared by identify and search.
pub fn book_sheet_schema() -> Value {
    json!({
        "type": "OBJECT",
        "nullable": true,
        "properties": {
            "title": string_schema(),
            "author": string_schema(),
            "summary": string_schema(),
            "category": string_schema(),
            "mainIdeas": string_list_schema(),
            "recommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string_schema(),
                        "author": string_schema()
                    }
                }
            }
        },
        "required": ["title", "author", "summary", "category", "recommendations"]
    })
}

/// Response schema for a deep-analysis request under `plan`.
pub fn deep_analysis_schema(plan: DeepAnalysisPlan) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("influences".to_string(), string_list_schema());
    properties.insert("historicalContext".to_string(), string_schema());
    properties.insert("detailedBio".to_string(), string_schema());
    if plan.include_basic {
        properties.insert("summary".to_string(), string_schema());
        properties.insert("category".to_string(), string_schema());
        properties.insert("mainIdeas".to_string(), string_list_schema());
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": plan.required_fields(),
    })
}

/// Provider payload of identify/search calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSheet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub main_ideas: Option<Vec<String>>,
    #[serde(default)]
    pub recommendations: Option<Vec<BookRef>>,
}

impl BookSheet {
    /// Turns the sheet into a fresh `ToRead` record with an empty cover.
    ///
    /// Returns `None` when the provider did not name a title and author,
    /// which is how "nothing recognizable" comes back in practice.
    pub fn into_book(self, id_prefix: &str) -> Option<Book> {
        let title = self.title.trim();
        let author = self.author.trim();
        if title.is_empty() || author.is_empty() {
            return None;
        }
        let mut book = Book::stub(new_record_id(id_prefix), title, author);
        book.apply_overlay(&BookOverlay {
            summary: self.summary,
            category: self.category,
            main_ideas: self.main_ideas,
            recommendations: self.recommendations.map(|recs| {
                recs.into_iter()
                    .filter(|rec| !rec.title.trim().is_empty())
                    .collect()
            }),
            ..BookOverlay::default()
        });
        Some(book)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        deep_analysis_prompt, deep_analysis_schema, search_prompt, BookSheet, DeepAnalysisPlan,
    };
    use crate::i18n::Locale;
    use crate::model::book::{Book, BookOverlay, ReadingStatus};

    #[test]
    fn stub_plan_requests_basic_fields_in_prompt_and_schema() {
        let stub = Book::stub("x", "T", "A");
        let plan = DeepAnalysisPlan::for_book(&stub);
        assert!(plan.include_basic);

        let prompt = deep_analysis_prompt(&stub, plan, Locale::En);
        assert!(prompt.contains("'summary'"));
        assert!(prompt.contains("'detailedBio'"));

        let schema = deep_analysis_schema(plan);
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 6);
        assert!(schema["properties"]["mainIdeas"].is_object());
    }

    #[test]
    fn basic_plan_requests_only_deep_fields() {
        let mut book = Book::stub("x", "T", "A");
        book.summary = Some("known".to_string());
        let plan = DeepAnalysisPlan::for_book(&book);
        assert!(!plan.include_basic);

        let prompt = deep_analysis_prompt(&book, plan, Locale::Fr);
        assert!(!prompt.contains("'summary'"));
        assert!(prompt.contains("IN FRENCH"));
        assert!(deep_analysis_schema(plan)["properties"]["summary"].is_null());
    }

    #[test]
    fn restrict_drops_unrequested_fields() {
        let plan = DeepAnalysisPlan {
            include_basic: false,
        };
        let overlay = plan.restrict(BookOverlay {
            summary: Some("unrequested".to_string()),
            detailed_bio: Some("bio".to_string()),
            ..BookOverlay::default()
        });
        assert!(overlay.summary.is_none());
        assert_eq!(overlay.detailed_bio.as_deref(), Some("bio"));
    }

    #[test]
    fn sheet_without_title_is_not_a_book() {
        let sheet = BookSheet {
            author: "Someone".to_string(),
            ..BookSheet::default()
        };
        assert!(sheet.into_book("search").is_none());
    }

    #[test]
    fn sheet_becomes_fresh_to_read_record() {
        let sheet: BookSheet = serde_json::from_str(
            r#"{"title":" Dune ","author":"Frank Herbert","summary":"Spice.","category":"SF",
                "mainIdeas":["a","b","c"],
                "recommendations":[{"title":"Hyperion","author":"Dan Simmons"},{"title":"","author":"x"}]}"#,
        )
        .unwrap();
        let book = sheet.into_book("search").unwrap();
        assert!(book.id.starts_with("search-"));
        assert_eq!(book.title, "Dune");
        assert_eq!(book.status, ReadingStatus::ToRead);
        assert!(book.cover_url.is_empty());
        assert_eq!(book.recommendations.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn search_prompt_embeds_trimmed_query() {
        let prompt = search_prompt("  dune herbert ", Locale::En);
        assert!(prompt.contains("\"dune herbert\""));
        assert!(prompt.contains("IN ENGLISH"));
    }
}
