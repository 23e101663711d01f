// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-store
//!
//! The storage layer of the warden token system:
//!
//! - **Keygen**: opaque token key generation (timestamp-prefixed OS
//!   randomness, URL-safe base64) and the key well-formedness predicate
//! - **Store**: `TokenStore<T>`, the keyed token map with LRU eviction,
//!   expiry pruning, per-user single-session replacement, bulk deletions,
//!   and inline stats maintenance
//! - **Snapshot**: tolerant snapshot loading, atomic file writes, and the
//!   background writer thread
//!
//! The store is deliberately **not** internally locked: the facade in
//! `warden-auth` owns a single reader/writer lock over the store and the
//! group map together, so that token and policy reads observe one consistent
//! world.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod keygen;
pub mod snapshot;
pub mod store;

pub use keygen::{generate_token_key, validate_token_key};
pub use snapshot::{load_snapshot, Snapshot, SnapshotWriter};
pub use store::TokenStore;
