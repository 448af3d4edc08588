//! Store configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve the database file path and logging settings in one place.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; missing values fall back to defaults.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Database file path override.
pub const DB_PATH_ENV: &str = "COCKTAIL_DB_PATH";
/// Log level override (`trace|debug|info|warn|error`).
pub const LOG_LEVEL_ENV: &str = "COCKTAIL_LOG_LEVEL";
/// Absolute directory for rolling log files. Logging stays off when unset.
pub const LOG_DIR_ENV: &str = "COCKTAIL_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "saved_cocktails.sqlite3";

/// Resolved settings for opening a [`crate::SavedCocktailsStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Reads settings from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = StoreConfig::from_lookup(|_| None);

        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("saved_cocktails.sqlite3")
        );
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_trimmed_and_used() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /data/cocktails.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/cocktails"),
        ]));

        assert_eq!(config.db_path, PathBuf::from("/data/cocktails.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/cocktails")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "   "),
            (LOG_DIR_ENV, ""),
        ]));

        assert!(config.db_path.ends_with("saved_cocktails.sqlite3"));
        assert_eq!(config.log_dir, None);
    }
}
