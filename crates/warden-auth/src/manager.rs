// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The manager facade: construction, token lifecycle, stats, user data, and
//! snapshot orchestration.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use warden_core::{
    compile_group, validate_group_spec, Config, ErrorCode, Group, GroupSpec, MessageCatalog,
    SharedClock, Stats, SystemClock, Token, WardenResult,
};
use warden_store::snapshot::{load_snapshot, Snapshot, SnapshotWriter};
use warden_store::TokenStore;

// =============================================================================
// Manager
// =============================================================================

/// Everything the lock protects, as one unit: token and policy reads must
/// observe a single consistent world.
pub(crate) struct State<T> {
    pub(crate) store: TokenStore<T>,
    pub(crate) groups: HashMap<u32, Group>,
}

/// The token authentication and authorization manager.
///
/// Generic over the host payload type `T`, which must be cheap to clone —
/// read paths return payloads by value, never references into the
/// lock-protected map. The manager is owned by the host; there is no global
/// instance.
pub struct Manager<T> {
    pub(crate) state: RwLock<State<T>>,
    pub(crate) config: Config,
    pub(crate) catalog: Arc<MessageCatalog>,
    pub(crate) clock: SharedClock,
    pub(crate) renew_seconds: i64,
    writer: Option<SnapshotWriter>,
}

impl<T> Manager<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Creates a manager from a configuration and an initial group list,
    /// using the built-in message catalog and the system clock.
    ///
    /// Fails with [`ErrorCode::InvalidParams`] on a bad configuration and
    /// [`ErrorCode::GroupInvalid`] on a bad group definition. When a snapshot
    /// path is configured, a load is attempted; a missing or malformed file
    /// is logged and the manager starts empty.
    pub fn new(config: Config, groups: Vec<GroupSpec>) -> WardenResult<Self> {
        Self::with_clock(config, groups, MessageCatalog::new(), Arc::new(SystemClock))
    }

    /// Creates a manager with a host-supplied message catalog.
    pub fn with_catalog(
        config: Config,
        groups: Vec<GroupSpec>,
        catalog: MessageCatalog,
    ) -> WardenResult<Self> {
        Self::with_clock(config, groups, catalog, Arc::new(SystemClock))
    }

    /// Creates a manager with a host-supplied catalog and clock.
    pub fn with_clock(
        mut config: Config,
        specs: Vec<GroupSpec>,
        catalog: MessageCatalog,
        clock: SharedClock,
    ) -> WardenResult<Self> {
        config.normalize();
        config.validate()?;

        let mut groups = HashMap::new();
        for spec in &specs {
            validate_group_spec(spec, &config)?;
            groups.insert(spec.id, compile_group(spec, &config.delimiter));
        }

        let now = clock.now();
        let mut store = TokenStore::new(now);
        let mut writer = None;

        if config.persistence_enabled() {
            let path = PathBuf::from(&config.cache_file_path);
            match load_snapshot::<T>(&path) {
                Ok(Some(snapshot)) => {
                    store = TokenStore::from_snapshot(snapshot.tokens, snapshot.stats);
                    let pruned = store.prune_expired(now);
                    info!(
                        restored = store.len(),
                        pruned,
                        path = %path.display(),
                        "restored token snapshot"
                    );
                }
                Ok(None) => {}
                Err(code) => {
                    warn!(
                        code = code.code(),
                        path = %path.display(),
                        "snapshot load failed; starting empty"
                    );
                }
            }
            match SnapshotWriter::spawn(path) {
                Ok(spawned) => writer = Some(spawned),
                Err(err) => {
                    warn!(error = %err, "snapshot writer unavailable; persistence disabled");
                }
            }
        }

        let renew_seconds = config.renew_seconds();
        Ok(Self {
            state: RwLock::new(State { store, groups }),
            config,
            catalog: Arc::new(catalog),
            clock,
            renew_seconds,
            writer,
        })
    }

    // =========================================================================
    // Token Lifecycle
    // =========================================================================

    /// Issues a token for `user_id` under `group_id`, bound to `client_ip`.
    ///
    /// When the group forbids multiple logins, every existing token of the
    /// user is deleted first. Under a capacity ceiling, expired entries are
    /// pruned and — if the store is still full — the least-recently-accessed
    /// token is evicted.
    pub fn add_token(&self, user_id: u32, group_id: u32, client_ip: &str) -> WardenResult<String> {
        if user_id == 0 {
            return Err(ErrorCode::UserInvalid);
        }
        if group_id == 0 {
            return Err(ErrorCode::GroupInvalid);
        }
        if client_ip.parse::<IpAddr>().is_err() {
            return Err(ErrorCode::InvalidIp);
        }

        let now = self.clock.now();
        let mut state = self.state.write();
        let (expire_seconds, single_session) = {
            let group = state
                .groups
                .get(&group_id)
                .ok_or(ErrorCode::GroupNotFound)?;
            (group.expire_seconds, !group.allow_multiple_login)
        };

        state.store.admit(
            user_id,
            group_id,
            client_ip,
            expire_seconds,
            single_session,
            self.config.max_tokens,
            now,
        )
    }

    /// Returns a copy of a live token record, updating its access time.
    ///
    /// An expired entry is removed and reported as
    /// [`ErrorCode::TokenExpired`]; an unknown key is
    /// [`ErrorCode::TokenNotFound`].
    pub fn get_token(&self, key: &str) -> WardenResult<Token<T>> {
        let now = self.clock.now();

        let copied = {
            let state = self.state.read();
            match state.store.get(key) {
                None => return Err(ErrorCode::TokenNotFound),
                Some(token) if token.is_expired_at(now) => None,
                Some(token) => Some(token.clone()),
            }
        };

        match copied {
            None => {
                let mut state = self.state.write();
                state.store.remove_if_expired(key, now);
                Err(ErrorCode::TokenExpired)
            }
            Some(mut token) => {
                // The entry may have vanished between the locks; only a
                // successful re-validated touch is reflected in the copy.
                let mut state = self.state.write();
                if state.store.touch(key, now, 0) {
                    token.last_access_time = now;
                }
                Ok(token)
            }
        }
    }

    /// Deletes a token. A second call for the same key reports
    /// [`ErrorCode::InvalidToken`] and leaves the stats untouched.
    pub fn del_token(&self, key: &str) -> WardenResult<()> {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.remove(key, now)
    }

    /// Replaces a stored token record in place, stamping its access time.
    pub fn update_token(&self, key: &str, token: Token<T>) -> WardenResult<()> {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.replace(key, token, now)
    }

    /// Deletes every token of one user.
    pub fn del_tokens_by_user(&self, user_id: u32) -> WardenResult<()> {
        if user_id == 0 {
            return Err(ErrorCode::UserInvalid);
        }
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.remove_user_tokens(user_id, now);
        Ok(())
    }

    /// Deletes every token of one group. The group itself must exist and is
    /// left in place.
    pub fn del_tokens_by_group(&self, group_id: u32) -> WardenResult<()> {
        if group_id == 0 {
            return Err(ErrorCode::GroupInvalid);
        }
        let now = self.clock.now();
        let mut state = self.state.write();
        if !state.groups.contains_key(&group_id) {
            return Err(ErrorCode::GroupNotFound);
        }
        state.store.remove_group_tokens(group_id, now);
        Ok(())
    }

    /// Sweeps all expired entries. Idempotent.
    pub fn clean_expired_tokens(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.prune_expired(now)
    }

    // =========================================================================
    // Stats
    // =========================================================================

    /// Returns a copy of the current counters.
    pub fn get_stats(&self) -> Stats {
        let state = self.state.read();
        state.store.stats()
    }

    /// Like [`get_stats`](Self::get_stats), but gives up when the read lock
    /// cannot be acquired within `timeout`.
    pub fn try_get_stats_for(&self, timeout: Duration) -> Option<Stats> {
        let state = self.state.try_read_for(timeout)?;
        Some(state.store.stats())
    }

    // =========================================================================
    // User Data
    // =========================================================================

    /// Stores the host payload for a session, touching its access time.
    pub fn set_user_data(&self, key: &str, data: T) -> WardenResult<()> {
        if key.trim().is_empty() {
            return Err(ErrorCode::InvalidToken);
        }
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.set_user_data(key, data, now)
    }

    /// Returns a copy of the host payload for a session, touching its access
    /// time. An expired entry is removed and reported.
    pub fn get_user_data(&self, key: &str) -> WardenResult<T> {
        if key.trim().is_empty() {
            return Err(ErrorCode::InvalidToken);
        }
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.read_user_data(key, now)
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Captures a consistent `{tokens, stats}` view and queues it for the
    /// background writer. A no-op when persistence is disabled.
    ///
    /// Serialization happens on the calling thread, outside the lock; only
    /// the file write is offloaded.
    pub fn save_snapshot(&self) -> WardenResult<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };

        let (tokens, stats) = {
            let state = self.state.read();
            state.store.snapshot_view()
        };
        let payload =
            serde_json::to_vec(&Snapshot { tokens, stats }).map_err(|_| ErrorCode::Internal)?;
        writer.submit(payload);
        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The message catalog.
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Resolves a code to a message in the configured language.
    pub fn error_message(&self, code: ErrorCode) -> &str {
        self.catalog.message(&self.config.language_tag, code)
    }
}

impl<T> fmt::Debug for Manager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("max_tokens", &self.config.max_tokens)
            .field("language_tag", &self.config.language_tag)
            .field("persistence", &self.config.persistence_enabled())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
