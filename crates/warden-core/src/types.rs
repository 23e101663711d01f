// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data model for the warden token system.
//!
//! These types are shared across the storage and facade layers. They carry no
//! behavior beyond what the data itself implies (expiry predicates, builders);
//! all locking and lifecycle orchestration happens above them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Rule Types
// =============================================================================

/// Decision attached to an API rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Requests matching the rule prefix are permitted.
    Allow,
    /// Requests matching the rule prefix are rejected.
    Deny,
}

impl RuleAction {
    /// Returns `true` for [`RuleAction::Allow`].
    #[inline]
    pub fn is_allow(&self) -> bool {
        matches!(self, RuleAction::Allow)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Allow => write!(f, "allow"),
            RuleAction::Deny => write!(f, "deny"),
        }
    }
}

/// A single compiled authorization rule: a path prefix plus a decision.
///
/// The `path` is a sequence of non-empty segments; a rule applies to a request
/// when every one of its segments equals the corresponding request segment.
/// A literal `*` segment is matched as the string `"*"` — there is no
/// wildcard expansion at match time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRule {
    /// Path segments the rule applies to.
    pub path: Vec<String>,
    /// Allow or deny.
    pub rule: RuleAction,
}

impl ApiRule {
    /// Creates a rule from segments and a decision.
    pub fn new(path: Vec<String>, rule: RuleAction) -> Self {
        Self { path, rule }
    }

    /// Creates an allow rule.
    pub fn allow(path: Vec<String>) -> Self {
        Self::new(path, RuleAction::Allow)
    }

    /// Creates a deny rule.
    pub fn deny(path: Vec<String>) -> Self {
        Self::new(path, RuleAction::Deny)
    }
}

// =============================================================================
// Group
// =============================================================================

/// A compiled authorization policy.
///
/// Groups are produced by [`compile_group`](crate::rules::compile_group) from
/// a [`GroupSpec`]; the rule vector is pre-sorted so that the matcher's
/// longest-prefix choice is also the most specific choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Descriptive name.
    pub name: String,
    /// Sorted allow/deny rules.
    pub api_rules: Vec<ApiRule>,
    /// Default token lifetime in seconds; `0` means tokens never expire.
    pub expire_seconds: i64,
    /// When `false`, issuing a token for a user deletes all of the user's
    /// prior tokens (single-session enforcement).
    pub allow_multiple_login: bool,
}

// =============================================================================
// GroupSpec
// =============================================================================

/// Human-authored group definition, as supplied by the host at construction
/// or through group CRUD.
///
/// `allowed_apis` / `denied_apis` are delimited path lists; `token_expire`
/// uses the `s|m|h|d` duration grammar (a bare integer is seconds, an empty
/// string means never expires). `allow_multiple_login` is an integer flag
/// (`0` or `1`) to keep the wire form trivial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupSpec {
    /// Group id; must be non-zero.
    pub id: u32,
    /// Descriptive name; must be non-blank.
    pub name: String,
    /// Delimited list of allowed path prefixes.
    pub allowed_apis: String,
    /// Delimited list of denied path prefixes.
    pub denied_apis: String,
    /// Token lifetime as a duration string.
    pub token_expire: String,
    /// `1` to allow concurrent sessions per user, `0` to enforce one.
    pub allow_multiple_login: i32,
}

impl GroupSpec {
    /// Creates a spec with the given id and name and empty rule lists.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the allowed path list.
    pub fn with_allowed(mut self, apis: impl Into<String>) -> Self {
        self.allowed_apis = apis.into();
        self
    }

    /// Sets the denied path list.
    pub fn with_denied(mut self, apis: impl Into<String>) -> Self {
        self.denied_apis = apis.into();
        self
    }

    /// Sets the token lifetime.
    pub fn with_expire(mut self, expire: impl Into<String>) -> Self {
        self.token_expire = expire.into();
        self
    }

    /// Enables or disables concurrent sessions per user.
    pub fn with_multiple_login(mut self, allowed: bool) -> Self {
        self.allow_multiple_login = i32::from(allowed);
        self
    }
}

// =============================================================================
// Token
// =============================================================================

/// A live session record, generic over the host payload type `T`.
///
/// Records handed to callers are always copies; the maps inside the manager
/// are never aliased. Expiry is driven by `login_time`, not
/// `last_access_time`: touching a token does not extend its life unless the
/// renewal grant is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token<T> {
    /// Owning user; non-zero.
    pub user_id: u32,
    /// Policy group the token was issued under; non-zero.
    pub group_id: u32,
    /// Client IP captured at issuance.
    pub ip: String,
    /// Instant of creation.
    pub login_time: DateTime<Utc>,
    /// Updated on every successful auth and on explicit data reads/writes.
    pub last_access_time: DateTime<Utc>,
    /// Lifetime in seconds from `login_time`; `0` means never expires.
    pub expire_seconds: i64,
    /// Opaque host payload.
    pub user_data: T,
}

impl<T: Default> Token<T> {
    /// Creates a fresh record with a default-valued payload.
    pub fn new(
        user_id: u32,
        group_id: u32,
        ip: impl Into<String>,
        expire_seconds: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            group_id,
            ip: ip.into(),
            login_time: now,
            last_access_time: now,
            expire_seconds,
            user_data: T::default(),
        }
    }
}

impl<T> Token<T> {
    /// Returns `true` if the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.expire_seconds == 0 {
            return false;
        }
        now > self.login_time + Duration::seconds(self.expire_seconds)
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Aggregate token counters.
///
/// `total_tokens` tracks the live map size; `active_tokens` counts
/// non-expired entries as of the last update; `expired_tokens` is a
/// cumulative counter of expirations ever observed, not the current count of
/// expired entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Number of entries currently stored.
    pub total_tokens: u64,
    /// Non-expired entries as of the last update.
    pub active_tokens: u64,
    /// Cumulative count of observed expirations.
    pub expired_tokens: u64,
    /// Instant of the last counter adjustment.
    pub last_update_time: DateTime<Utc>,
}

impl Stats {
    /// Creates zeroed stats stamped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_tokens: 0,
            active_tokens: 0,
            expired_tokens: 0,
            last_update_time: now,
        }
    }

    /// Records a single insertion.
    pub fn record_added(&mut self, now: DateTime<Utc>) {
        self.total_tokens += 1;
        self.active_tokens += 1;
        self.last_update_time = now;
    }

    /// Records removals: `live` entries that were still valid and `expired`
    /// entries that were observed expired at removal time. The cumulative
    /// expiration counter only ever grows.
    ///
    /// An expired entry stopped being active the moment it expired, not when
    /// it was swept, so `active_tokens` is not charged for it — but it is
    /// clamped to `total_tokens` so the counters can never invert.
    pub fn record_removals(&mut self, live: u64, expired: u64, now: DateTime<Utc>) {
        if live == 0 && expired == 0 {
            return;
        }
        self.total_tokens = self.total_tokens.saturating_sub(live + expired);
        self.active_tokens = self
            .active_tokens
            .saturating_sub(live)
            .min(self.total_tokens);
        self.expired_tokens += expired;
        self.last_update_time = now;
    }
}

// =============================================================================
// Tests
// =============================================================================
