// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error codes and the per-language message catalog.
//!
//! Every public operation of the manager reports its outcome as an
//! [`ErrorCode`]; nothing panics or unwinds across the API boundary. Codes
//! carry stable integer values grouped by prefix:
//!
//! ```text
//! 0     Success
//! 1xxx  system / configuration / cache
//! 2xxx  token, IP, and authorization failures
//! 3xxx  user and group input failures
//! 9999  unknown
//! ```
//!
//! Human-readable messages are a collaborator concern: the core emits codes,
//! and a [`MessageCatalog`] — built in (`en`, `zh`) or host-extended —
//! resolves them per language tag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// =============================================================================
// ErrorCode
// =============================================================================

/// Outcome of a manager operation.
///
/// The `Display` form is the default English message; hosts needing other
/// languages resolve codes through a [`MessageCatalog`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The operation succeeded.
    #[error("Success")]
    Success = 0,

    /// Invalid configuration or call parameters.
    #[error("Invalid parameters")]
    InvalidParams = 1001,

    /// The snapshot file could not be read.
    #[error("Cache file load failed")]
    CacheLoadFail = 1101,
    /// The snapshot file could not be parsed.
    #[error("Cache file parse failed")]
    CacheParseFail = 1102,

    /// Unexpected internal failure.
    #[error("Internal error")]
    Internal = 1901,

    /// The token key is missing, malformed, or unknown.
    #[error("Invalid token")]
    InvalidToken = 2001,
    /// The token's lifetime has elapsed.
    #[error("Token expired")]
    TokenExpired = 2002,
    /// No token is stored under the given key.
    #[error("Token not found")]
    TokenNotFound = 2003,
    /// The store is at capacity.
    #[error("Token limit exceeded")]
    TokenLimit = 2004,
    /// Token generation failed (RNG failure or key collision).
    #[error("Token generation failed")]
    TokenGenerate = 2005,

    /// The supplied IP address does not parse.
    #[error("Invalid IP address")]
    InvalidIp = 2101,
    /// The presented IP differs from the one bound at issuance.
    #[error("IP address mismatch")]
    IpMismatch = 2102,

    /// The session is no longer authorized (stolen, orphaned, or raced).
    #[error("Access forbidden")]
    Forbidden = 2201,
    /// The group's rules deny the requested path.
    #[error("API access not allowed")]
    Unauthorized = 2202,
    /// The requested URL is not recognized.
    #[error("Invalid URL")]
    ApiNotFound = 2203,

    /// The user id is zero or otherwise invalid.
    #[error("Invalid user ID")]
    UserInvalid = 3001,

    /// The group id is zero or otherwise invalid.
    #[error("Invalid user group ID")]
    GroupInvalid = 3101,
    /// No group exists under the given id.
    #[error("User group not found")]
    GroupNotFound = 3102,

    /// Unclassified failure.
    #[error("Unknown error")]
    Unknown = 9999,
}

impl ErrorCode {
    /// Returns the stable integer value of the code.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Returns `true` for [`ErrorCode::Success`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Returns the taxonomy group of the code, for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self.code() {
            0 => "success",
            1000..=1999 => "system",
            2000..=2999 => "auth",
            3000..=3999 => "principal",
            _ => "unknown",
        }
    }

    /// All defined codes, in value order.
    pub fn all() -> &'static [ErrorCode] {
        &[
            ErrorCode::Success,
            ErrorCode::InvalidParams,
            ErrorCode::CacheLoadFail,
            ErrorCode::CacheParseFail,
            ErrorCode::Internal,
            ErrorCode::InvalidToken,
            ErrorCode::TokenExpired,
            ErrorCode::TokenNotFound,
            ErrorCode::TokenLimit,
            ErrorCode::TokenGenerate,
            ErrorCode::InvalidIp,
            ErrorCode::IpMismatch,
            ErrorCode::Forbidden,
            ErrorCode::Unauthorized,
            ErrorCode::ApiNotFound,
            ErrorCode::UserInvalid,
            ErrorCode::GroupInvalid,
            ErrorCode::GroupNotFound,
            ErrorCode::Unknown,
        ]
    }

    fn message_zh(&self) -> &'static str {
        match self {
            ErrorCode::Success => "成功",
            ErrorCode::InvalidParams => "无效的配置",
            ErrorCode::CacheLoadFail => "加载缓存文件失败",
            ErrorCode::CacheParseFail => "缓存文件解析错误",
            ErrorCode::Internal => "内部错误",
            ErrorCode::InvalidToken => "无效的token",
            ErrorCode::TokenExpired => "token已过期",
            ErrorCode::TokenNotFound => "token不存在",
            ErrorCode::TokenLimit => "超出token数量限制",
            ErrorCode::TokenGenerate => "生成token失败",
            ErrorCode::InvalidIp => "无效的IP地址",
            ErrorCode::IpMismatch => "IP地址不匹配",
            ErrorCode::Forbidden => "禁止访问",
            ErrorCode::Unauthorized => "无权访问该API",
            ErrorCode::ApiNotFound => "无效的URL",
            ErrorCode::UserInvalid => "无效的用户ID",
            ErrorCode::GroupInvalid => "无效的用户组ID",
            ErrorCode::GroupNotFound => "用户组不存在",
            ErrorCode::Unknown => "未知错误",
        }
    }
}

/// A `Result` whose error side is an [`ErrorCode`].
pub type WardenResult<T> = Result<T, ErrorCode>;

// =============================================================================
// MessageCatalog
// =============================================================================

/// Maps `(language tag, code)` to a human-readable message.
///
/// Ships with `en` and `zh` built in. Unknown languages fall back to the
/// fallback language (`en` by default); unknown codes fall back to the
/// [`ErrorCode::Unknown`] message.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<String, HashMap<ErrorCode, String>>,
    fallback: String,
}

impl MessageCatalog {
    /// Creates a catalog with the built-in languages.
    pub fn new() -> Self {
        let mut messages: HashMap<String, HashMap<ErrorCode, String>> = HashMap::new();

        let en = ErrorCode::all()
            .iter()
            .map(|code| (*code, code.to_string()))
            .collect();
        let zh = ErrorCode::all()
            .iter()
            .map(|code| (*code, code.message_zh().to_string()))
            .collect();

        messages.insert("en".to_string(), en);
        messages.insert("zh".to_string(), zh);

        Self {
            messages,
            fallback: "en".to_string(),
        }
    }

    /// Creates a catalog with the built-in languages plus host overrides.
    ///
    /// Overrides are applied on top of the defaults: supplying a message for
    /// an existing `(language, code)` pair replaces it, and supplying a new
    /// language registers it.
    pub fn with_overrides(
        overrides: HashMap<String, HashMap<ErrorCode, String>>,
    ) -> Self {
        let mut catalog = Self::new();
        for (lang, entries) in overrides {
            for (code, message) in entries {
                catalog.register(&lang, code, message);
            }
        }
        catalog
    }

    /// Registers or replaces a single message.
    pub fn register(&mut self, lang: &str, code: ErrorCode, message: impl Into<String>) {
        self.messages
            .entry(lang.to_string())
            .or_default()
            .insert(code, message.into());
    }

    /// Sets the fallback language used for unknown tags.
    pub fn set_fallback(&mut self, lang: impl Into<String>) {
        self.fallback = lang.into();
    }

    /// Resolves a message for the given language tag.
    ///
    /// Lookup order: the requested language, then the fallback language,
    /// then the fallback language's [`ErrorCode::Unknown`] message.
    pub fn message(&self, lang: &str, code: ErrorCode) -> &str {
        if let Some(table) = self.messages.get(lang) {
            if let Some(msg) = table.get(&code) {
                return msg;
            }
        }
        if let Some(table) = self.messages.get(&self.fallback) {
            if let Some(msg) = table.get(&code) {
                return msg;
            }
            if let Some(msg) = table.get(&ErrorCode::Unknown) {
                return msg;
            }
        }
        "Unknown error"
    }

    /// Returns the registered language tags.
    pub fn languages(&self) -> Vec<&str> {
        self.messages.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
