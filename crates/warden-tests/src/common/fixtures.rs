// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pre-built groups and configurations for integration tests.

use warden_core::{Config, GroupSpec};

// =============================================================================
// Group Fixtures
// =============================================================================

/// Ready-made group definitions.
pub struct GroupFixtures;

impl GroupFixtures {
    /// Single-session admin policy: broad allows, one carved-out deny,
    /// two-hour lifetime.
    pub fn admin(id: u32) -> GroupSpec {
        GroupSpec::new(id, "admin")
            .with_allowed("/api/admin /api/user /api/admin/users")
            .with_denied("/api/admin/delete")
            .with_expire("2h")
            .with_multiple_login(false)
    }

    /// Multi-login user policy: `/api/user` allowed, its admin subtree
    /// denied, one-hour lifetime.
    pub fn user(id: u32) -> GroupSpec {
        GroupSpec::new(id, "user")
            .with_allowed("/api/user")
            .with_denied("/api/user/admin")
            .with_expire("1h")
            .with_multiple_login(true)
    }

    /// A policy containing a literal `*` segment next to a concrete deny.
    pub fn wildcard(id: u32) -> GroupSpec {
        GroupSpec::new(id, "wildcard")
            .with_allowed("/api/*")
            .with_denied("/api/admin")
            .with_expire("1h")
            .with_multiple_login(true)
    }

    /// A group with no rules at all: every path is unauthorized.
    pub fn ruleless(id: u32) -> GroupSpec {
        GroupSpec::new(id, "ruleless")
            .with_expire("1h")
            .with_multiple_login(true)
    }

    /// A multi-login group whose tokens expire after one second. Pair with
    /// [`ConfigFixtures::fast_expiry`].
    pub fn short_lived(id: u32) -> GroupSpec {
        GroupSpec::new(id, "short-lived")
            .with_allowed("/api/user")
            .with_expire("1s")
            .with_multiple_login(true)
    }

    /// A single-session group with a one-hour lifetime.
    pub fn single_session(id: u32) -> GroupSpec {
        GroupSpec::new(id, "single-session")
            .with_allowed("/api/user")
            .with_expire("1h")
            .with_multiple_login(false)
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Ready-made configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default configuration with renewal disabled, so lifetimes in tests
    /// stay exactly what the group says.
    pub fn no_renewal() -> Config {
        Config::default().with_token_renew_time("")
    }

    /// Accepts second-scale group lifetimes (for expiry tests) and disables
    /// renewal.
    pub fn fast_expiry() -> Config {
        Self::no_renewal().with_expire_bounds(1, 86_400)
    }

    /// A tight capacity ceiling, renewal disabled.
    pub fn bounded(max_tokens: i64) -> Config {
        Self::no_renewal().with_max_tokens(max_tokens)
    }

    /// Snapshot persistence into the given path, renewal disabled.
    pub fn persistent(path: impl Into<String>) -> Config {
        Self::no_renewal().with_cache_file_path(path)
    }
}
