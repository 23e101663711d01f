// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Snapshot Integration Tests
//!
//! Persistence across manager instances: save on one, restore on the next,
//! and tolerate missing or corrupt files.

use std::fs;
use std::sync::Arc;

use warden_auth::{ErrorCode, Manager, ManualClock, MessageCatalog};
use warden_tests::common::{init_test_logging, ConfigFixtures, GroupFixtures};

fn manager_at(
    path: &str,
    clock: Arc<ManualClock>,
) -> Manager<String> {
    Manager::with_clock(
        ConfigFixtures::persistent(path),
        vec![GroupFixtures::user(1)],
        MessageCatalog::new(),
        clock,
    )
    .unwrap()
}

#[test]
fn test_snapshot_round_trip_across_instances() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.snapshot");
    let path = path.to_str().unwrap();

    let clock = Arc::new(ManualClock::starting_now());
    let first = manager_at(path, clock.clone());

    let token = first.add_token(7, 1, "10.0.0.1").unwrap();
    first.set_user_data(&token, "carried-over".to_string()).unwrap();
    first.save_snapshot().unwrap();
    drop(first); // joins the writer thread, flushing the snapshot

    let second = manager_at(path, clock);
    let restored = second.get_token(&token).unwrap();
    assert_eq!(restored.user_id, 7);
    assert_eq!(restored.ip, "10.0.0.1");
    assert_eq!(second.get_user_data(&token).unwrap(), "carried-over");
    assert_eq!(second.get_stats().total_tokens, 1);
}

#[test]
fn test_snapshot_restore_prunes_expired_entries() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.snapshot");
    let path = path.to_str().unwrap();

    let clock = Arc::new(ManualClock::starting_now());
    let first = Manager::<String>::with_clock(
        ConfigFixtures::persistent(path).with_expire_bounds(1, 86_400),
        vec![GroupFixtures::short_lived(1), GroupFixtures::user(2)],
        MessageCatalog::new(),
        clock.clone(),
    )
    .unwrap();

    let doomed = first.add_token(1, 1, "10.0.0.1").unwrap();
    let keeper = first.add_token(2, 2, "10.0.0.1").unwrap();
    first.save_snapshot().unwrap();
    drop(first);

    // Time passes while the process is down; the restart sweeps the token
    // that expired in the meantime.
    clock.advance_secs(5);
    let second = manager_at(path, clock);
    assert_eq!(second.get_token(&doomed), Err(ErrorCode::TokenNotFound));
    assert!(second.get_token(&keeper).is_ok());
}

#[test]
fn test_missing_snapshot_starts_empty() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-written.snapshot");

    let clock = Arc::new(ManualClock::starting_now());
    let manager = manager_at(path.to_str().unwrap(), clock);
    assert_eq!(manager.get_stats().total_tokens, 0);
}

#[test]
fn test_corrupt_snapshot_starts_empty_without_failing() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.snapshot");
    fs::write(&path, b"definitely { not json").unwrap();

    let clock = Arc::new(ManualClock::starting_now());
    let manager = manager_at(path.to_str().unwrap(), clock);

    // Construction succeeded and the manager is fully usable.
    assert_eq!(manager.get_stats().total_tokens, 0);
    let token = manager.add_token(1, 1, "10.0.0.1").unwrap();
    assert!(manager.get_token(&token).is_ok());
}

#[test]
fn test_snapshot_file_uses_camel_case_wire_format() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.snapshot");

    let clock = Arc::new(ManualClock::starting_now());
    let manager = manager_at(path.to_str().unwrap(), clock);
    let token = manager.add_token(7, 1, "10.0.0.1").unwrap();
    manager.save_snapshot().unwrap();
    drop(manager);

    let raw = fs::read(&path).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

    let record = &json["tokens"][&token];
    assert_eq!(record["userId"], 7);
    assert_eq!(record["groupId"], 1);
    assert_eq!(record["ip"], "10.0.0.1");
    assert!(record.get("loginTime").is_some());
    assert!(record.get("lastAccessTime").is_some());
    assert!(record.get("expireSeconds").is_some());
    assert!(json["stats"].get("totalTokens").is_some());
    assert!(json["stats"].get("lastUpdateTime").is_some());
}

#[test]
fn test_save_without_persistence_is_a_noop() {
    init_test_logging();
    let clock = Arc::new(ManualClock::starting_now());
    let manager = Manager::<String>::with_clock(
        ConfigFixtures::no_renewal(),
        vec![GroupFixtures::user(1)],
        MessageCatalog::new(),
        clock,
    )
    .unwrap();

    manager.add_token(1, 1, "10.0.0.1").unwrap();
    assert!(manager.save_snapshot().is_ok());
}

#[test]
fn test_snapshot_overwrites_previous_state() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.snapshot");
    let path = path.to_str().unwrap();

    let clock = Arc::new(ManualClock::starting_now());
    let first = manager_at(path, clock.clone());
    let stale = first.add_token(1, 1, "10.0.0.1").unwrap();
    first.save_snapshot().unwrap();

    first.del_token(&stale).unwrap();
    let fresh = first.add_token(2, 1, "10.0.0.1").unwrap();
    first.save_snapshot().unwrap();
    drop(first);

    let second = manager_at(path, clock);
    assert_eq!(second.get_token(&stale), Err(ErrorCode::TokenNotFound));
    assert!(second.get_token(&fresh).is_ok());
    assert_eq!(second.get_stats().total_tokens, 1);
}
