//! Locale selection and static translation table.
//!
//! Unknown keys resolve to the key itself so a missing entry is visible in
//! the UI instead of blank.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Supported display/generation locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Fr,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::En),
            "fr" | "french" | "francais" | "français" => Some(Self::Fr),
            _ => None,
        }
    }
}

static TRANSLATIONS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        ("lib.title", ("My Library", "Ma Bibliothèque")),
        ("lib.filter.all", ("All", "Tous")),
        ("lib.filter.read", ("Read", "Lus")),
        ("lib.filter.reading", ("Reading", "En cours")),
        ("lib.filter.toread", ("To Read", "À lire")),
        (
            "scan.permission",
            (
                "Unable to access camera. Please ensure permissions are granted.",
                "Impossible d'accéder à la caméra. Veuillez vérifier les permissions.",
            ),
        ),
        (
            "scan.error",
            (
                "Analysis failed. Try closer framing.",
                "Analyse échouée. Essayez de vous rapprocher.",
            ),
        ),
        ("scan.identifying", ("Analyzing Book...", "Analyse du livre...")),
        (
            "scan.searching",
            ("Searching Archives...", "Recherche dans les archives..."),
        ),
        ("scan.align", ("Align Book Cover", "Aligner la couverture")),
        (
            "scan.identify_error",
            (
                "Could not identify a book. Please try again.",
                "Impossible d'identifier le livre. Réessayez.",
            ),
        ),
        ("scan.mode_camera", ("Camera", "Caméra")),
        ("scan.mode_search", ("Search", "Recherche")),
        ("detail.generate_full", ("Generate Full Analysis", "Générer l'Analyse Complète")),
        ("detail.generate_basic", ("Generate Book Sheet", "Créer la Fiche du Livre")),
        (
            "detail.generating",
            ("Analyzing literary context...", "Analyse du contexte littéraire..."),
        ),
        (
            "detail.generating_basic",
            ("Writing book summary...", "Rédaction de la fiche..."),
        ),
        ("detail.preview_mode", ("Preview Mode", "Mode Aperçu")),
        ("detail.toast_added", ("Added to Library", "Ajouté à la bibliothèque")),
        (
            "detail.toast_removed",
            ("Removed from Library", "Retiré de la bibliothèque"),
        ),
        ("detail.thinking", ("Thinking...", "Réflexion...")),
        (
            "ai.apology",
            (
                "Sorry, I'm having trouble connecting to the literary archives right now.",
                "Désolé, j'ai du mal à me connecter aux archives littéraires pour le moment.",
            ),
        ),
        (
            "ai.no_answer",
            (
                "I couldn't find an answer for that.",
                "Je n'ai pas trouvé de réponse à cette question.",
            ),
        ),
    ])
});

/// Translates `key` for `locale`, falling back to the key.
pub fn translate(key: &str, locale: Locale) -> String {
    match TRANSLATIONS.get(key) {
        Some((en, fr)) => match locale {
            Locale::En => (*en).to_string(),
            Locale::Fr => (*fr).to_string(),
        },
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{translate, Locale};

    #[test]
    fn translate_picks_locale_column() {
        assert_eq!(translate("lib.filter.read", Locale::En), "Read");
        assert_eq!(translate("lib.filter.read", Locale::Fr), "Lus");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(translate("nope.missing", Locale::En), "nope.missing");
    }

    #[test]
    fn locale_parse_accepts_codes_and_names() {
        assert_eq!(Locale::parse("EN"), Some(Locale::En));
        assert_eq!(Locale::parse("français"), Some(Locale::Fr));
        assert_eq!(Locale::parse("de"), None);
        assert_eq!(Locale::default(), Locale::Fr);
    }
}
