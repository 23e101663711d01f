// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The authorization pipeline.
//!
//! `auth` runs the full verification chain: token lookup, expiry, IP
//! binding, group lookup, path matching, and finally the access-time update.
//! The chain holds the read lock; the update takes the write lock and
//! re-validates the token first, because the entry may have been deleted or
//! expired while no lock was held. A token that vanishes in that window is
//! reported as no longer authorized rather than as a transient error.

use serde::de::DeserializeOwned;
use serde::Serialize;

use warden_core::{has_permission, ErrorCode};
use warden_store::validate_token_key;

use crate::manager::Manager;

/// IP-binding policy of an auth entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpBinding {
    /// The presented IP must always equal the one bound at issuance.
    Always,
    /// The IP is checked only for single-session groups; groups allowing
    /// multiple logins tolerate a mismatch (roaming clients).
    SingleSessionOnly,
}

/// What the read phase decided.
enum ReadPhase {
    /// Terminal: return this code without touching anything.
    Done(ErrorCode),
    /// The token was observed expired; remove it under the write lock.
    ExpiredCleanup,
    /// Access granted; update the access time under the write lock.
    Touch,
}

impl<T> Manager<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Verifies that `key` is a live session bound to `client_ip` whose
    /// group permits `api`. This is the primary, strict entry point: the IP
    /// binding is unconditional.
    ///
    /// With no groups configured at all, authorization is disabled and every
    /// call succeeds (fail-open pass-through); with groups configured but no
    /// matching rule, access is denied (fail-closed).
    pub fn auth(&self, key: &str, client_ip: &str, api: &str) -> ErrorCode {
        self.auth_with_binding(key, client_ip, api, IpBinding::Always)
    }

    /// Like [`auth`](Self::auth), but the IP binding is enforced only for
    /// single-session groups: when the token's group allows multiple logins,
    /// a differing client IP is tolerated.
    pub fn authenticate(&self, key: &str, client_ip: &str, api: &str) -> ErrorCode {
        self.auth_with_binding(key, client_ip, api, IpBinding::SingleSessionOnly)
    }

    fn auth_with_binding(
        &self,
        key: &str,
        client_ip: &str,
        api: &str,
        binding: IpBinding,
    ) -> ErrorCode {
        if key.trim().is_empty() {
            return ErrorCode::InvalidToken;
        }
        let now = self.clock.now();

        let phase = {
            let state = self.state.read();
            if state.groups.is_empty() {
                // No policy configured: the manager is a pass-through.
                ReadPhase::Done(ErrorCode::Success)
            } else {
                match state.store.get(key) {
                    None => ReadPhase::Done(ErrorCode::InvalidToken),
                    Some(token) if token.is_expired_at(now) => ReadPhase::ExpiredCleanup,
                    Some(token) => {
                        let group = state.groups.get(&token.group_id);
                        let enforce_ip = match binding {
                            IpBinding::Always => true,
                            IpBinding::SingleSessionOnly => {
                                group.map(|g| !g.allow_multiple_login).unwrap_or(true)
                            }
                        };
                        if enforce_ip && token.ip != client_ip {
                            ReadPhase::Done(ErrorCode::Forbidden)
                        } else {
                            match group {
                                None => ReadPhase::Done(ErrorCode::Forbidden),
                                Some(group) if group.api_rules.is_empty() => {
                                    ReadPhase::Done(ErrorCode::Unauthorized)
                                }
                                Some(group) => {
                                    if has_permission(api, &group.api_rules) {
                                        ReadPhase::Touch
                                    } else {
                                        ReadPhase::Done(ErrorCode::Unauthorized)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };

        match phase {
            ReadPhase::Done(code) => code,
            ReadPhase::ExpiredCleanup => {
                let mut state = self.state.write();
                state.store.remove_if_expired(key, now);
                ErrorCode::TokenExpired
            }
            ReadPhase::Touch => {
                let mut state = self.state.write();
                if state.store.touch(key, now, self.renew_seconds) {
                    ErrorCode::Success
                } else {
                    // Deleted or expired between the locks.
                    ErrorCode::Forbidden
                }
            }
        }
    }

    /// Checks several paths in one pass, holding the lock once.
    ///
    /// `results[i]` is `true` exactly when `auth(key, client_ip, apis[i])`
    /// would have returned [`ErrorCode::Success`].
    pub fn batch_auth<S: AsRef<str>>(
        &self,
        key: &str,
        client_ip: &str,
        apis: &[S],
    ) -> Vec<bool> {
        let mut results = vec![false; apis.len()];
        if key.trim().is_empty() {
            return results;
        }
        let now = self.clock.now();

        let phase = {
            let state = self.state.read();
            if state.groups.is_empty() {
                results.iter_mut().for_each(|granted| *granted = true);
                return results;
            }
            match state.store.get(key) {
                None => return results,
                Some(token) if token.is_expired_at(now) => ReadPhase::ExpiredCleanup,
                Some(token) => {
                    if token.ip != client_ip {
                        return results;
                    }
                    let Some(group) = state.groups.get(&token.group_id) else {
                        return results;
                    };
                    if group.api_rules.is_empty() {
                        return results;
                    }
                    for (granted, api) in results.iter_mut().zip(apis) {
                        *granted = has_permission(api.as_ref(), &group.api_rules);
                    }
                    if results.iter().any(|granted| *granted) {
                        ReadPhase::Touch
                    } else {
                        ReadPhase::Done(ErrorCode::Unauthorized)
                    }
                }
            }
        };

        match phase {
            ReadPhase::Done(_) => results,
            ReadPhase::ExpiredCleanup => {
                let mut state = self.state.write();
                state.store.remove_if_expired(key, now);
                results
            }
            ReadPhase::Touch => {
                let mut state = self.state.write();
                if state.store.touch(key, now, self.renew_seconds) {
                    results
                } else {
                    // The session vanished between the locks; every grant
                    // would have failed individually.
                    vec![false; apis.len()]
                }
            }
        }
    }

    /// Validates the shape of `key` and reports whether it names a live
    /// session, without touching the access time.
    ///
    /// Returns [`ErrorCode::InvalidToken`] for a malformed key,
    /// [`ErrorCode::TokenNotFound`] for an unknown one,
    /// [`ErrorCode::TokenExpired`] for an expired one (which is removed), and
    /// [`ErrorCode::Success`] otherwise.
    pub fn check_token(&self, key: &str) -> ErrorCode {
        if !validate_token_key(key) {
            return ErrorCode::InvalidToken;
        }
        let now = self.clock.now();

        let expired = {
            let state = self.state.read();
            match state.store.get(key) {
                None => return ErrorCode::TokenNotFound,
                Some(token) => token.is_expired_at(now),
            }
        };

        if expired {
            let mut state = self.state.write();
            state.store.remove_if_expired(key, now);
            return ErrorCode::TokenExpired;
        }
        ErrorCode::Success
    }
}

// =============================================================================
// Tests
// =============================================================================
