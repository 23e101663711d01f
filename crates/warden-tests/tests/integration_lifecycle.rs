// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Token Lifecycle Integration Tests
//!
//! Issuance, expiry, renewal, LRU eviction, single-session replacement,
//! bulk deletion, and the stat invariants that tie them together.

use warden_auth::{Config, ErrorCode};
use warden_tests::common::{init_test_logging, ConfigFixtures, GroupFixtures, ManagerBuilder};

// =============================================================================
// Expiry
// =============================================================================

#[test]
fn test_token_expires_after_group_lifetime() {
    init_test_logging();
    let (manager, clock) = ManagerBuilder::new()
        .config(ConfigFixtures::fast_expiry())
        .group(GroupFixtures::short_lived(1))
        .build();
    let token = manager.add_token(1, 1, "10.0.0.1").unwrap();

    clock.advance_secs(2);
    assert_eq!(
        manager.auth(&token, "10.0.0.1", "/api/user"),
        ErrorCode::TokenExpired
    );
    assert_eq!(manager.get_token(&token), Err(ErrorCode::TokenNotFound));
}

#[test]
fn test_expiry_counts_are_cumulative() {
    init_test_logging();
    let (manager, clock) = ManagerBuilder::new()
        .config(ConfigFixtures::fast_expiry())
        .group(GroupFixtures::short_lived(1))
        .build();

    for user in 1..=3 {
        manager.add_token(user, 1, "10.0.0.1").unwrap();
    }
    clock.advance_secs(2);
    manager.batch_delete_expired_tokens().unwrap();

    for user in 4..=5 {
        manager.add_token(user, 1, "10.0.0.1").unwrap();
    }
    clock.advance_secs(2);
    manager.batch_delete_expired_tokens().unwrap();

    let stats = manager.get_stats();
    assert_eq!(stats.total_tokens, 0);
    // The counter accumulates across sweeps instead of tracking a current
    // count.
    assert_eq!(stats.expired_tokens, 5);
}

#[test]
fn test_renewal_keeps_active_session_alive() {
    init_test_logging();
    let config = Config::default()
        .with_token_renew_time("30m")
        .with_expire_bounds(1, 86_400);
    let (manager, clock) = ManagerBuilder::new()
        .config(config)
        .group(GroupFixtures::user(1))
        .build();
    let token = manager.add_token(1, 1, "10.0.0.1").unwrap();

    // Auth every 25 minutes; each success re-floors the lifetime to
    // "30 minutes from now", carrying the session past its original hour.
    for _ in 0..4 {
        clock.advance_secs(1_500);
        assert_eq!(
            manager.auth(&token, "10.0.0.1", "/api/user"),
            ErrorCode::Success
        );
    }

    // Left alone past the renewal grant, the token finally dies.
    clock.advance_secs(2_000);
    assert_eq!(
        manager.auth(&token, "10.0.0.1", "/api/user"),
        ErrorCode::TokenExpired
    );
}

// =============================================================================
// Single-session replacement
// =============================================================================

#[test]
fn test_single_session_replacement() {
    init_test_logging();
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::no_renewal())
        .group(GroupFixtures::single_session(1))
        .build();

    let t1 = manager.add_token(42, 1, "10.0.0.1").unwrap();
    let t2 = manager.add_token(42, 1, "10.0.0.2").unwrap();

    assert_eq!(manager.get_token(&t1), Err(ErrorCode::TokenNotFound));
    assert!(manager.get_token(&t2).is_ok());
    assert_eq!(manager.get_stats().total_tokens, 1);
}

#[test]
fn test_single_session_removes_every_prior_token() {
    init_test_logging();
    // Issue several tokens under a multi-login group, then flip the policy
    // to single-session and log in again: all prior sessions must go.
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::no_renewal())
        .group(GroupFixtures::user(1))
        .build();

    for _ in 0..3 {
        manager.add_token(42, 1, "10.0.0.1").unwrap();
    }
    assert_eq!(manager.get_tokens_by_user(42).len(), 3);

    manager
        .update_group(&GroupFixtures::user(1).with_multiple_login(false))
        .unwrap();
    let survivor = manager.add_token(42, 1, "10.0.0.9").unwrap();

    let remaining = manager.get_tokens_by_user(42);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].ip, "10.0.0.9");
    assert!(manager.get_token(&survivor).is_ok());
}

// =============================================================================
// Capacity & LRU
// =============================================================================

#[test]
fn test_lru_eviction_under_capacity_pressure() {
    init_test_logging();
    let (manager, clock) = ManagerBuilder::new()
        .config(ConfigFixtures::bounded(2))
        .group(GroupFixtures::user(1))
        .build();

    let t1 = manager.add_token(1, 1, "10.0.0.1").unwrap();
    clock.advance_secs(1);
    let t2 = manager.add_token(2, 1, "10.0.0.1").unwrap();

    // Touch t1 so t2 becomes the least-recently-accessed entry.
    clock.advance_secs(1);
    manager.get_token(&t1).unwrap();

    clock.advance_secs(1);
    let t3 = manager.add_token(3, 1, "10.0.0.1").unwrap();

    assert!(manager.get_token(&t1).is_ok());
    assert_eq!(manager.get_token(&t2), Err(ErrorCode::TokenNotFound));
    assert!(manager.get_token(&t3).is_ok());
    assert_eq!(manager.get_stats().total_tokens, 2);
}

#[test]
fn test_capacity_never_exceeded() {
    init_test_logging();
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::bounded(5))
        .group(GroupFixtures::user(1))
        .build();

    for user in 1..=20 {
        manager.add_token(user, 1, "10.0.0.1").unwrap();
        assert!(manager.get_stats().total_tokens <= 5);
    }
    assert_eq!(manager.get_stats().total_tokens, 5);
}

#[test]
fn test_expired_entries_are_pruned_before_eviction() {
    init_test_logging();
    let config = ConfigFixtures::fast_expiry().with_max_tokens(2);
    let (manager, clock) = ManagerBuilder::new()
        .config(config)
        .groups([GroupFixtures::short_lived(1), GroupFixtures::user(2)])
        .build();

    let doomed = manager.add_token(1, 1, "10.0.0.1").unwrap();
    let keeper = manager.add_token(2, 2, "10.0.0.1").unwrap();

    // The short-lived token expires; inserting at capacity prunes it
    // instead of evicting the live one.
    clock.advance_secs(2);
    let fresh = manager.add_token(3, 2, "10.0.0.1").unwrap();

    assert_eq!(manager.get_token(&doomed), Err(ErrorCode::TokenNotFound));
    assert!(manager.get_token(&keeper).is_ok());
    assert!(manager.get_token(&fresh).is_ok());
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn test_del_token_second_call_fails_and_preserves_stats() {
    init_test_logging();
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::no_renewal())
        .group(GroupFixtures::user(1))
        .build();
    let token = manager.add_token(1, 1, "10.0.0.1").unwrap();

    manager.del_token(&token).unwrap();
    let stats = manager.get_stats();

    assert_eq!(manager.del_token(&token), Err(ErrorCode::InvalidToken));
    assert_eq!(manager.get_stats(), stats);
}

#[test]
fn test_del_group_deletes_its_tokens_too() {
    init_test_logging();
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::no_renewal())
        .groups([GroupFixtures::user(1), GroupFixtures::user(2)])
        .build();

    manager.add_token(1, 1, "10.0.0.1").unwrap();
    manager.add_token(2, 2, "10.0.0.1").unwrap();
    manager.add_token(3, 2, "10.0.0.1").unwrap();

    manager.del_group(2).unwrap();

    assert!(manager.get_tokens_by_group(2).is_empty());
    assert_eq!(manager.get_stats().total_tokens, 1);
    assert_eq!(manager.get_group(2), Err(ErrorCode::GroupNotFound));
}

#[test]
fn test_bulk_deletes_by_user_and_group() {
    init_test_logging();
    let (manager, _clock) = ManagerBuilder::new()
        .config(ConfigFixtures::no_renewal())
        .groups([GroupFixtures::user(1), GroupFixtures::user(2)])
        .build();

    manager.add_token(1, 1, "10.0.0.1").unwrap();
    manager.add_token(1, 2, "10.0.0.1").unwrap();
    manager.add_token(2, 1, "10.0.0.1").unwrap();

    manager.del_tokens_by_user(1).unwrap();
    assert!(manager.get_tokens_by_user(1).is_empty());
    assert_eq!(manager.get_stats().total_tokens, 1);

    manager.del_tokens_by_group(1).unwrap();
    assert_eq!(manager.get_stats().total_tokens, 0);
    // The group itself survives a token-only deletion.
    assert!(manager.get_group(1).is_ok());
}

// =============================================================================
// Payload
// =============================================================================

#[test]
fn test_user_data_survives_lifecycle_until_expiry() {
    init_test_logging();

    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Profile {
        name: String,
        roles: Vec<String>,
    }

    let (manager, clock) = ManagerBuilder::new()
        .config(ConfigFixtures::fast_expiry())
        .group(GroupFixtures::short_lived(1))
        .build_with_payload::<Profile>();

    let token = manager.add_token(1, 1, "10.0.0.1").unwrap();
    assert_eq!(manager.get_user_data(&token).unwrap(), Profile::default());

    let profile = Profile {
        name: "ada".into(),
        roles: vec!["ops".into()],
    };
    manager.set_user_data(&token, profile.clone()).unwrap();
    assert_eq!(manager.get_user_data(&token).unwrap(), profile);

    clock.advance_secs(2);
    assert_eq!(manager.get_user_data(&token), Err(ErrorCode::TokenExpired));
    assert_eq!(manager.get_user_data(&token), Err(ErrorCode::InvalidToken));
}
