// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Manager configuration.

use serde::{Deserialize, Serialize};

use crate::duration::{is_well_formed_duration, parse_duration};
use crate::error::{ErrorCode, WardenResult};

/// Default capacity ceiling.
pub const DEFAULT_MAX_TOKENS: i64 = 10_000;
/// Default allow/deny list delimiter.
pub const DEFAULT_DELIMITER: &str = " ";
/// Default renewal grant applied on successful auth.
pub const DEFAULT_TOKEN_RENEW_TIME: &str = "10m";
/// Default language tag for error messages.
pub const DEFAULT_LANGUAGE_TAG: &str = "zh";
/// Default lower bound for per-group token lifetimes (seconds).
pub const DEFAULT_MIN_TOKEN_EXPIRE: i64 = 60;
/// Default upper bound for per-group token lifetimes (seconds, 30 days).
pub const DEFAULT_MAX_TOKEN_EXPIRE: i64 = 2_592_000;

// =============================================================================
// Config
// =============================================================================

/// Manager configuration.
///
/// All fields have working defaults; hosts typically start from
/// `Config::default()` and override a handful of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Capacity ceiling for the token store; `<= 0` means unbounded.
    pub max_tokens: i64,
    /// Separator used to split the allow/deny strings of a group definition.
    /// Must be non-empty.
    pub delimiter: String,
    /// Renewal grant applied on successful auth, as a duration string.
    /// Empty disables renewal.
    pub token_renew_time: String,
    /// Opaque key into the error-message catalog.
    pub language_tag: String,
    /// Lower bound for non-zero per-group lifetimes (seconds).
    pub min_token_expire: i64,
    /// Upper bound for non-zero per-group lifetimes (seconds).
    pub max_token_expire: i64,
    /// Snapshot file path; empty disables persistence.
    pub cache_file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            delimiter: DEFAULT_DELIMITER.to_string(),
            token_renew_time: DEFAULT_TOKEN_RENEW_TIME.to_string(),
            language_tag: DEFAULT_LANGUAGE_TAG.to_string(),
            min_token_expire: DEFAULT_MIN_TOKEN_EXPIRE,
            max_token_expire: DEFAULT_MAX_TOKEN_EXPIRE,
            cache_file_path: String::new(),
        }
    }
}

impl Config {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity ceiling.
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the allow/deny list delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the renewal grant.
    pub fn with_token_renew_time(mut self, renew: impl Into<String>) -> Self {
        self.token_renew_time = renew.into();
        self
    }

    /// Sets the error-message language tag.
    pub fn with_language_tag(mut self, tag: impl Into<String>) -> Self {
        self.language_tag = tag.into();
        self
    }

    /// Sets the bounds for non-zero per-group lifetimes.
    pub fn with_expire_bounds(mut self, min: i64, max: i64) -> Self {
        self.min_token_expire = min;
        self.max_token_expire = max;
        self
    }

    /// Sets the snapshot file path.
    pub fn with_cache_file_path(mut self, path: impl Into<String>) -> Self {
        self.cache_file_path = path.into();
        self
    }

    /// Fills blank fields with their defaults.
    ///
    /// Hosts deserializing partial configuration end up with empty strings
    /// where they meant "default"; normalization happens before validation so
    /// such configs are accepted.
    pub fn normalize(&mut self) {
        if self.delimiter.is_empty() {
            self.delimiter = DEFAULT_DELIMITER.to_string();
        }
        if self.language_tag.trim().is_empty() {
            self.language_tag = DEFAULT_LANGUAGE_TAG.to_string();
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> WardenResult<()> {
        if self.delimiter.is_empty() {
            return Err(ErrorCode::InvalidParams);
        }
        if !is_well_formed_duration(&self.token_renew_time) {
            return Err(ErrorCode::InvalidParams);
        }
        let tag = self.language_tag.trim();
        if !(2..=5).contains(&tag.len()) || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ErrorCode::InvalidParams);
        }
        if self.min_token_expire < 0 || self.max_token_expire < self.min_token_expire {
            return Err(ErrorCode::InvalidParams);
        }
        Ok(())
    }

    /// Returns the renewal grant in seconds (`0` disables renewal).
    pub fn renew_seconds(&self) -> i64 {
        parse_duration(&self.token_renew_time)
    }

    /// Returns `true` if a capacity ceiling is configured.
    pub fn is_bounded(&self) -> bool {
        self.max_tokens > 0
    }

    /// Returns `true` if snapshot persistence is enabled.
    pub fn persistence_enabled(&self) -> bool {
        !self.cache_file_path.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_tokens, 10_000);
        assert_eq!(config.delimiter, " ");
        assert_eq!(config.token_renew_time, "10m");
        assert_eq!(config.language_tag, "zh");
        assert_eq!(config.min_token_expire, 60);
        assert_eq!(config.max_token_expire, 2_592_000);
        assert!(!config.persistence_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_renew_seconds() {
        assert_eq!(Config::default().renew_seconds(), 600);
        let config = Config::default().with_token_renew_time("");
        assert_eq!(config.renew_seconds(), 0);
    }

    #[test]
    fn test_normalize_fills_blanks() {
        let mut config = Config::default()
            .with_delimiter("")
            .with_language_tag("  ");
        config.normalize();
        assert_eq!(config.delimiter, " ");
        assert_eq!(config.language_tag, "zh");
    }

    #[test]
    fn test_validate_rejects_bad_renew_time() {
        let config = Config::default().with_token_renew_time("10x");
        assert_eq!(config.validate(), Err(ErrorCode::InvalidParams));
    }

    #[test]
    fn test_validate_rejects_bad_language_tag() {
        assert_eq!(
            Config::default().with_language_tag("e").validate(),
            Err(ErrorCode::InvalidParams)
        );
        assert_eq!(
            Config::default().with_language_tag("en-US").validate(),
            Err(ErrorCode::InvalidParams)
        );
    }

    #[test]
    fn test_validate_rejects_inverted_expire_bounds() {
        let config = Config::default().with_expire_bounds(3_600, 60);
        assert_eq!(config.validate(), Err(ErrorCode::InvalidParams));
    }

    #[test]
    fn test_unbounded_when_non_positive() {
        assert!(!Config::default().with_max_tokens(0).is_bounded());
        assert!(!Config::default().with_max_tokens(-1).is_bounded());
        assert!(Config::default().with_max_tokens(1).is_bounded());
    }
}
