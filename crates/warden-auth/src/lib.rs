// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-auth
//!
//! The outward face of the warden token system: an embeddable, in-process
//! manager that issues opaque session tokens, authorizes API paths against
//! per-group allow/deny rules, and keeps all state in memory behind a single
//! reader/writer lock.
//!
//! ## Example
//!
//! ```rust
//! use warden_auth::{Config, ErrorCode, GroupSpec, Manager};
//!
//! let groups = vec![GroupSpec::new(1, "user")
//!     .with_allowed("/api/user")
//!     .with_denied("/api/user/admin")
//!     .with_expire("1h")
//!     .with_multiple_login(true)];
//!
//! let manager: Manager<()> = Manager::new(Config::default(), groups).unwrap();
//!
//! let token = manager.add_token(1, 1, "192.168.1.1").unwrap();
//! assert_eq!(
//!     manager.auth(&token, "192.168.1.1", "/api/user/profile"),
//!     ErrorCode::Success
//! );
//! assert_eq!(
//!     manager.auth(&token, "192.168.1.1", "/api/user/admin/reset"),
//!     ErrorCode::Unauthorized
//! );
//! ```
//!
//! ## Concurrency
//!
//! All public operations may be called from any number of threads. A single
//! `RwLock` guards the token map, the group map, and the stats together.
//! Authorization takes the read lock for lookup and matching, releases it,
//! then takes the write lock and re-validates before updating the access
//! time — the lock is never upgraded in place.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod auth;
mod batch;
mod groups;
mod manager;

pub use manager::Manager;

// Re-export the model and configuration surface so hosts depend on one crate.
pub use warden_core::{
    ApiRule, Clock, Config, ErrorCode, Group, GroupSpec, ManualClock, MessageCatalog,
    RuleAction, SharedClock, Stats, SystemClock, Token, WardenResult,
};
pub use warden_store::{generate_token_key, validate_token_key};

// =============================================================================
// Shared test fixtures
// =============================================================================
