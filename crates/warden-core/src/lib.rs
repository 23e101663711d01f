// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core abstractions for the warden in-process token system.
//!
//! This crate provides the foundational pieces shared by the storage and
//! facade layers:
//!
//! - **Types**: `Token<T>`, `Group`, `ApiRule`, `GroupSpec`, `Stats`
//! - **Error**: the stable `ErrorCode` taxonomy and the per-language
//!   `MessageCatalog`
//! - **Config**: manager configuration with defaults and validation
//! - **Clock**: injectable time source for deterministic tests
//! - **Path**: request-path segmentation and longest-prefix rule matching
//! - **Rules**: compilation of human-authored group definitions into sorted
//!   rule vectors
//!
//! Nothing in this crate locks or performs I/O; the concurrency envelope and
//! persistence live in `warden-auth` and `warden-store`.
//!
//! ## Example
//!
//! ```rust
//! use warden_core::{compile_group, has_permission, GroupSpec};
//!
//! let spec = GroupSpec::new(1, "staff")
//!     .with_allowed("/api/user /api/orders")
//!     .with_denied("/api/user/admin")
//!     .with_expire("1h");
//!
//! let group = compile_group(&spec, " ");
//! assert!(has_permission("/api/user/profile", &group.api_rules));
//! assert!(!has_permission("/api/user/admin/reset", &group.api_rules));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod path;
pub mod rules;
pub mod types;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use duration::{is_well_formed_duration, parse_duration};
pub use error::{ErrorCode, MessageCatalog, WardenResult};
pub use path::{check_permission, has_permission, parse_path_segments, parse_url_segments};
pub use rules::{compile_group, validate_group_spec};
pub use types::{ApiRule, Group, GroupSpec, RuleAction, Stats, Token};
