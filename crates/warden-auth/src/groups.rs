// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Group CRUD.
//!
//! Groups are validated and compiled outside the lock, then swapped in under
//! the write lock. Deleting a group also deletes every token issued under it
//! — leaving them would only turn later auths into `Forbidden`, but the
//! sweep keeps the stats honest and the store free of orphans.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use warden_core::{compile_group, validate_group_spec, ErrorCode, Group, GroupSpec, WardenResult};

use crate::manager::Manager;

impl<T> Manager<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Returns a copy of a compiled group.
    pub fn get_group(&self, group_id: u32) -> WardenResult<Group> {
        let state = self.state.read();
        state
            .groups
            .get(&group_id)
            .cloned()
            .ok_or(ErrorCode::GroupNotFound)
    }

    /// Adds a group, replacing any existing definition under the same id.
    pub fn add_group(&self, spec: &GroupSpec) -> WardenResult<()> {
        validate_group_spec(spec, &self.config)?;
        let group = compile_group(spec, &self.config.delimiter);

        let mut state = self.state.write();
        state.groups.insert(spec.id, group);
        info!(group_id = spec.id, name = %spec.name, "group added");
        Ok(())
    }

    /// Updates an existing group. Unknown ids are rejected.
    pub fn update_group(&self, spec: &GroupSpec) -> WardenResult<()> {
        validate_group_spec(spec, &self.config)?;
        let group = compile_group(spec, &self.config.delimiter);

        let mut state = self.state.write();
        if !state.groups.contains_key(&spec.id) {
            return Err(ErrorCode::GroupNotFound);
        }
        state.groups.insert(spec.id, group);
        info!(group_id = spec.id, "group updated");
        Ok(())
    }

    /// Replaces the entire policy with the given list (all-or-nothing
    /// validation). Tokens whose group disappears in the swap are deleted.
    pub fn update_all_groups(&self, specs: &[GroupSpec]) -> WardenResult<()> {
        for spec in specs {
            validate_group_spec(spec, &self.config)?;
        }
        let compiled: HashMap<u32, Group> = specs
            .iter()
            .map(|spec| (spec.id, compile_group(spec, &self.config.delimiter)))
            .collect();

        let now = self.clock.now();
        let mut state = self.state.write();
        state.groups = compiled;

        let live: HashSet<u32> = state.groups.keys().copied().collect();
        let orphaned = state.store.remove_orphans(&live, now);
        info!(groups = state.groups.len(), orphaned, "policy replaced");
        Ok(())
    }

    /// Deletes a group and every token issued under it.
    pub fn del_group(&self, group_id: u32) -> WardenResult<()> {
        if group_id == 0 {
            return Err(ErrorCode::GroupInvalid);
        }

        let now = self.clock.now();
        let mut state = self.state.write();
        if state.groups.remove(&group_id).is_none() {
            return Err(ErrorCode::GroupNotFound);
        }
        let removed = state.store.remove_group_tokens(group_id, now);
        info!(group_id, tokens_removed = removed, "group deleted");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
