//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Collect storage, provider and locale settings in one value.
//! - Decide once whether a usable provider credential exists.
//!
//! # Invariants
//! - Resolution never fails; invalid values fall back to defaults and are
//!   logged.
//! - The credential value itself is never logged.

use crate::i18n::Locale;
use crate::logging::default_log_level;
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "LUMA_DB_PATH";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_MODEL: &str = "LUMA_GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "LUMA_GEMINI_BASE_URL";
pub const ENV_LOCALE: &str = "LUMA_LOCALE";
pub const ENV_MOCK_DELAY_MS: &str = "LUMA_MOCK_DELAY_MS";
pub const ENV_LOG_LEVEL: &str = "LUMA_LOG_LEVEL";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_DB_FILE_NAME: &str = "luma_library.sqlite3";

/// Placeholder credential shipped with demo builds; treated as absent.
pub const DEMO_API_KEY_PLACEHOLDER: &str = "MOCK_KEY_FOR_DEMO";

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub locale: Locale,
    pub mock_delay: Duration,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: Locale::default(),
            mock_delay: DEFAULT_MOCK_DELAY,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        let locale = match value(ENV_LOCALE) {
            Some(raw) => Locale::parse(&raw).unwrap_or_else(|| {
                warn!("event=config_resolve module=config status=invalid key={ENV_LOCALE}");
                defaults.locale
            }),
            None => defaults.locale,
        };

        let mock_delay = match value(ENV_MOCK_DELAY_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .unwrap_or_else(|_| {
                    warn!(
                        "event=config_resolve module=config status=invalid key={ENV_MOCK_DELAY_MS}"
                    );
                    defaults.mock_delay
                }),
            None => defaults.mock_delay,
        };

        Self {
            db_path: value(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            api_key: value(ENV_API_KEY).or_else(|| value(ENV_API_KEY_FALLBACK)),
            model: value(ENV_MODEL).unwrap_or(defaults.model),
            base_url: value(ENV_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            locale,
            mock_delay,
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
        }
    }

    /// Returns the credential when it is usable for real provider calls.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != DEMO_API_KEY_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DEFAULT_MODEL, DEMO_API_KEY_PLACEHOLDER};
    use crate::i18n::Locale;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> CoreConfig {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        CoreConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults_without_credential() {
        let config = config_from(&[]);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.locale, Locale::Fr);
        assert!(config.usable_api_key().is_none());
    }

    #[test]
    fn placeholder_and_blank_keys_are_not_usable() {
        let config = config_from(&[("GEMINI_API_KEY", DEMO_API_KEY_PLACEHOLDER)]);
        assert!(config.usable_api_key().is_none());

        let config = config_from(&[("GEMINI_API_KEY", "   ")]);
        assert!(config.usable_api_key().is_none());
    }

    #[test]
    fn fallback_api_key_variable_is_honored() {
        let config = config_from(&[("API_KEY", "secret")]);
        assert_eq!(config.usable_api_key(), Some("secret"));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("LUMA_LOCALE", "de"),
            ("LUMA_MOCK_DELAY_MS", "soon"),
            ("LUMA_GEMINI_BASE_URL", "http://localhost:9000/"),
        ]);
        assert_eq!(config.locale, Locale::Fr);
        assert_eq!(config.mock_delay, Duration::from_millis(1500));
        assert_eq!(config.base_url, "http://localhost:9000");
    }
}
