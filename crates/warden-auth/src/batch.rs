// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batch deletions and by-owner queries.
//!
//! Batch deletions validate their whole id list before mutating anything
//! (all-or-nothing); the deletions themselves are a single pass over the
//! store under one write-lock acquisition.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;

use warden_core::{ErrorCode, Token, WardenResult};

use crate::manager::Manager;

impl<T> Manager<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Deletes every token belonging to any of the given users.
    ///
    /// An empty list is a successful no-op; a zero id rejects the whole
    /// batch before anything is removed.
    pub fn batch_delete_tokens_by_user_ids(&self, user_ids: &[u32]) -> WardenResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        if user_ids.contains(&0) {
            return Err(ErrorCode::UserInvalid);
        }

        let ids: HashSet<u32> = user_ids.iter().copied().collect();
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.remove_users(&ids, now);
        Ok(())
    }

    /// Deletes every token belonging to any of the given groups.
    ///
    /// Besides the zero-id check, every group must exist; an unknown id
    /// rejects the whole batch before anything is removed.
    pub fn batch_delete_tokens_by_group_ids(&self, group_ids: &[u32]) -> WardenResult<()> {
        if group_ids.is_empty() {
            return Ok(());
        }
        if group_ids.contains(&0) {
            return Err(ErrorCode::GroupInvalid);
        }

        let ids: HashSet<u32> = group_ids.iter().copied().collect();
        let now = self.clock.now();
        let mut state = self.state.write();
        if ids.iter().any(|id| !state.groups.contains_key(id)) {
            return Err(ErrorCode::GroupNotFound);
        }
        state.store.remove_groups(&ids, now);
        Ok(())
    }

    /// Deletes all expired entries. Idempotent; a second call removes zero.
    pub fn batch_delete_expired_tokens(&self) -> WardenResult<()> {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.store.prune_expired(now);
        Ok(())
    }

    /// Returns copies of every token belonging to the user.
    pub fn get_tokens_by_user(&self, user_id: u32) -> Vec<Token<T>> {
        if user_id == 0 {
            return Vec::new();
        }
        let state = self.state.read();
        state.store.tokens_for_user(user_id)
    }

    /// Returns copies of every token belonging to the group, or an empty
    /// vector when the group does not exist.
    pub fn get_tokens_by_group(&self, group_id: u32) -> Vec<Token<T>> {
        if group_id == 0 {
            return Vec::new();
        }
        let state = self.state.read();
        if !state.groups.contains_key(&group_id) {
            return Vec::new();
        }
        state.store.tokens_for_group(group_id)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::{manager_with_clock, user_group};
    use warden_core::ErrorCode;

    #[test]
    fn test_batch_delete_by_users() {
        let (manager, _clock) = manager_with_clock(vec![user_group(1)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();
        manager.add_token(2, 1, "10.0.0.1").unwrap();
        manager.add_token(3, 1, "10.0.0.1").unwrap();

        manager.batch_delete_tokens_by_user_ids(&[1, 3]).unwrap();

        assert!(manager.get_tokens_by_user(1).is_empty());
        assert_eq!(manager.get_tokens_by_user(2).len(), 1);
        assert_eq!(manager.get_stats().total_tokens, 1);
    }

    #[test]
    fn test_batch_delete_rejects_zero_ids_without_mutating() {
        let (manager, _clock) = manager_with_clock(vec![user_group(1)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();

        assert_eq!(
            manager.batch_delete_tokens_by_user_ids(&[1, 0]),
            Err(ErrorCode::UserInvalid)
        );
        assert_eq!(manager.get_tokens_by_user(1).len(), 1);

        assert_eq!(
            manager.batch_delete_tokens_by_group_ids(&[1, 0]),
            Err(ErrorCode::GroupInvalid)
        );
        assert_eq!(manager.get_stats().total_tokens, 1);
    }

    #[test]
    fn test_batch_delete_groups_is_all_or_nothing() {
        let (manager, _clock) = manager_with_clock(vec![user_group(1), user_group(2)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();
        manager.add_token(2, 2, "10.0.0.1").unwrap();

        // Group 9 does not exist: nothing may be deleted.
        assert_eq!(
            manager.batch_delete_tokens_by_group_ids(&[1, 9]),
            Err(ErrorCode::GroupNotFound)
        );
        assert_eq!(manager.get_stats().total_tokens, 2);

        manager.batch_delete_tokens_by_group_ids(&[1, 2]).unwrap();
        assert_eq!(manager.get_stats().total_tokens, 0);
    }

    #[test]
    fn test_empty_batches_are_noops() {
        let (manager, _clock) = manager_with_clock(vec![user_group(1)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();

        manager.batch_delete_tokens_by_user_ids(&[]).unwrap();
        manager.batch_delete_tokens_by_group_ids(&[]).unwrap();
        assert_eq!(manager.get_stats().total_tokens, 1);
    }

    #[test]
    fn test_batch_delete_expired_is_idempotent() {
        let (manager, clock) = manager_with_clock(vec![user_group(1)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();
        manager.add_token(2, 1, "10.0.0.1").unwrap();

        clock.advance_secs(3_601);
        manager.batch_delete_expired_tokens().unwrap();
        assert_eq!(manager.get_stats().total_tokens, 0);
        assert_eq!(manager.get_stats().expired_tokens, 2);

        manager.batch_delete_expired_tokens().unwrap();
        assert_eq!(manager.get_stats().expired_tokens, 2);
    }

    #[test]
    fn test_queries_return_copies_for_owner() {
        let (manager, _clock) = manager_with_clock(vec![user_group(1), user_group(2)]);
        manager.add_token(1, 1, "10.0.0.1").unwrap();
        manager.add_token(1, 2, "10.0.0.2").unwrap();

        let by_user = manager.get_tokens_by_user(1);
        assert_eq!(by_user.len(), 2);

        let by_group = manager.get_tokens_by_group(2);
        assert_eq!(by_group.len(), 1);
        assert_eq!(by_group[0].ip, "10.0.0.2");

        assert!(manager.get_tokens_by_user(0).is_empty());
        assert!(manager.get_tokens_by_group(99).is_empty());
    }
}
