// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The in-memory token store.
//!
//! `TokenStore` is a plain map plus inline stats; it performs no locking of
//! its own. The facade wraps it (together with the group map) in a single
//! reader/writer lock, so every method here assumes exclusive or shared
//! access as its receiver implies.
//!
//! Stat accounting is uniform across every removal path: entries that were
//! still live decrement `active_tokens`, entries observed expired at removal
//! time feed the cumulative `expired_tokens` counter instead.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::{ErrorCode, Stats, Token, WardenResult};

use crate::keygen::generate_token_key;

// =============================================================================
// TokenStore
// =============================================================================

/// Keyed map from opaque token key to session record, with capacity
/// enforcement and inline stats.
#[derive(Debug, Clone)]
pub struct TokenStore<T> {
    tokens: HashMap<String, Token<T>>,
    stats: Stats,
}

impl<T: Clone + Default> TokenStore<T> {
    /// Creates an empty store stamped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tokens: HashMap::new(),
            stats: Stats::new(now),
        }
    }

    /// Rebuilds a store from snapshot contents.
    pub fn from_snapshot(tokens: HashMap<String, Token<T>>, stats: Stats) -> Self {
        Self { tokens, stats }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns a copy of the current counters.
    pub fn stats(&self) -> Stats {
        self.stats.clone()
    }

    /// Raw access to a stored record, with no expiry handling.
    pub fn get(&self, key: &str) -> Option<&Token<T>> {
        self.tokens.get(key)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Admits a new session and returns its freshly generated key.
    ///
    /// The insert discipline, minus the input validation and group lookup
    /// the facade performs first:
    ///
    /// 1. When `single_session` is set, every existing token of the user is
    ///    removed (session replacement).
    /// 2. When a capacity ceiling applies, expired entries are pruned first;
    ///    if the store is still full, the least-recently-accessed entry is
    ///    evicted.
    /// 3. A fresh key is generated; a collision with a stored key is a fatal
    ///    generation error, never silently retried.
    pub fn admit(
        &mut self,
        user_id: u32,
        group_id: u32,
        ip: &str,
        expire_seconds: i64,
        single_session: bool,
        max_tokens: i64,
        now: DateTime<Utc>,
    ) -> WardenResult<String> {
        if single_session {
            let replaced = self.remove_user_tokens(user_id, now);
            if replaced > 0 {
                debug!(user_id, replaced, "replaced prior sessions");
            }
        }

        if max_tokens > 0 {
            self.prune_expired(now);
            if self.tokens.len() as i64 >= max_tokens {
                self.evict_lru(now);
            }
        }

        let key = generate_token_key(now)?;
        if self.tokens.contains_key(&key) {
            return Err(ErrorCode::TokenGenerate);
        }

        self.tokens
            .insert(key.clone(), Token::new(user_id, group_id, ip, expire_seconds, now));
        self.stats.record_added(now);
        Ok(key)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes a single entry.
    ///
    /// Missing keys report [`ErrorCode::InvalidToken`]; a second call for the
    /// same key is therefore an error and leaves the stats untouched.
    pub fn remove(&mut self, key: &str, now: DateTime<Utc>) -> WardenResult<()> {
        match self.tokens.remove(key) {
            None => Err(ErrorCode::InvalidToken),
            Some(token) => {
                if token.is_expired_at(now) {
                    self.stats.record_removals(0, 1, now);
                } else {
                    self.stats.record_removals(1, 0, now);
                }
                Ok(())
            }
        }
    }

    /// Removes the entry iff it is still present and expired. Returns whether
    /// a removal happened.
    ///
    /// This is the re-validation half of the read-release-then-write pattern:
    /// the caller observed an expired token under the read lock and must not
    /// assume it is still there.
    pub fn remove_if_expired(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let expired = self
            .tokens
            .get(key)
            .map(|token| token.is_expired_at(now))
            .unwrap_or(false);
        if expired {
            self.tokens.remove(key);
            self.stats.record_removals(0, 1, now);
        }
        expired
    }

    /// Removes every token of one user. Returns the number removed.
    pub fn remove_user_tokens(&mut self, user_id: u32, now: DateTime<Utc>) -> usize {
        self.remove_matching(now, |token| token.user_id == user_id)
    }

    /// Removes every token of one group. Returns the number removed.
    pub fn remove_group_tokens(&mut self, group_id: u32, now: DateTime<Utc>) -> usize {
        self.remove_matching(now, |token| token.group_id == group_id)
    }

    /// Removes every token belonging to any of the given users.
    pub fn remove_users(&mut self, user_ids: &HashSet<u32>, now: DateTime<Utc>) -> usize {
        self.remove_matching(now, |token| user_ids.contains(&token.user_id))
    }

    /// Removes every token belonging to any of the given groups.
    pub fn remove_groups(&mut self, group_ids: &HashSet<u32>, now: DateTime<Utc>) -> usize {
        self.remove_matching(now, |token| group_ids.contains(&token.group_id))
    }

    /// Removes tokens the given set of groups no longer covers.
    pub fn remove_orphans(&mut self, live_groups: &HashSet<u32>, now: DateTime<Utc>) -> usize {
        self.remove_matching(now, |token| !live_groups.contains(&token.group_id))
    }

    /// Deletes all expired entries. Returns the number removed. Idempotent:
    /// a second sweep finds nothing.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let pruned = self.remove_matching(now, |token| token.is_expired_at(now));
        if pruned > 0 {
            debug!(pruned, remaining = self.tokens.len(), "pruned expired tokens");
        }
        pruned
    }

    fn remove_matching<F>(&mut self, now: DateTime<Utc>, predicate: F) -> usize
    where
        F: Fn(&Token<T>) -> bool,
    {
        let keys: Vec<String> = self
            .tokens
            .iter()
            .filter(|(_, token)| predicate(token))
            .map(|(key, _)| key.clone())
            .collect();

        let mut live = 0u64;
        let mut expired = 0u64;
        for key in &keys {
            if let Some(token) = self.tokens.remove(key) {
                if token.is_expired_at(now) {
                    expired += 1;
                } else {
                    live += 1;
                }
            }
        }
        self.stats.record_removals(live, expired, now);
        keys.len()
    }

    /// Evicts the least-recently-accessed entry. Returns its key.
    pub fn evict_lru(&mut self, now: DateTime<Utc>) -> Option<String> {
        let victim = self
            .tokens
            .iter()
            .min_by_key(|(_, token)| token.last_access_time)
            .map(|(key, _)| key.clone())?;

        if let Some(token) = self.tokens.remove(&victim) {
            debug!(user_id = token.user_id, "evicted least-recently-used token");
            if token.is_expired_at(now) {
                self.stats.record_removals(0, 1, now);
            } else {
                self.stats.record_removals(1, 0, now);
            }
        }
        Some(victim)
    }

    // =========================================================================
    // Access & Mutation
    // =========================================================================

    /// Updates `last_access_time` iff the entry is still present and live.
    ///
    /// When `renew_seconds` is positive and the token is not of the
    /// never-expires kind, the stored lifetime is raised (never lowered) so
    /// that at least the renewal grant remains from this access.
    pub fn touch(&mut self, key: &str, now: DateTime<Utc>, renew_seconds: i64) -> bool {
        let Some(token) = self.tokens.get_mut(key) else {
            return false;
        };
        if token.is_expired_at(now) {
            return false;
        }

        token.last_access_time = now;
        if renew_seconds > 0 && token.expire_seconds > 0 {
            let elapsed = (now - token.login_time).num_seconds();
            let floor = elapsed + renew_seconds;
            if token.expire_seconds < floor {
                token.expire_seconds = floor;
            }
        }
        true
    }

    /// Replaces a stored record in place, stamping `last_access_time`.
    pub fn replace(&mut self, key: &str, mut token: Token<T>, now: DateTime<Utc>) -> WardenResult<()> {
        if !self.tokens.contains_key(key) {
            return Err(ErrorCode::InvalidToken);
        }
        token.last_access_time = now;
        self.tokens.insert(key.to_string(), token);
        Ok(())
    }

    /// Stores the host payload for a session, touching the access time.
    pub fn set_user_data(&mut self, key: &str, data: T, now: DateTime<Utc>) -> WardenResult<()> {
        if self.tokens.get(key).is_none() {
            return Err(ErrorCode::InvalidToken);
        }
        if self.remove_if_expired(key, now) {
            return Err(ErrorCode::TokenExpired);
        }
        // Present and live after the checks above.
        if let Some(token) = self.tokens.get_mut(key) {
            token.user_data = data;
            token.last_access_time = now;
        }
        Ok(())
    }

    /// Reads the host payload for a session, touching the access time.
    pub fn read_user_data(&mut self, key: &str, now: DateTime<Utc>) -> WardenResult<T> {
        if self.tokens.get(key).is_none() {
            return Err(ErrorCode::InvalidToken);
        }
        if self.remove_if_expired(key, now) {
            return Err(ErrorCode::TokenExpired);
        }
        match self.tokens.get_mut(key) {
            Some(token) => {
                token.last_access_time = now;
                Ok(token.user_data.clone())
            }
            None => Err(ErrorCode::InvalidToken),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copies of every token belonging to the user.
    pub fn tokens_for_user(&self, user_id: u32) -> Vec<Token<T>> {
        self.tokens
            .values()
            .filter(|token| token.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Copies of every token belonging to the group.
    pub fn tokens_for_group(&self, group_id: u32) -> Vec<Token<T>> {
        self.tokens
            .values()
            .filter(|token| token.group_id == group_id)
            .cloned()
            .collect()
    }

    /// Clones the full contents for snapshotting.
    pub fn snapshot_view(&self) -> (HashMap<String, Token<T>>, Stats) {
        (self.tokens.clone(), self.stats.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
