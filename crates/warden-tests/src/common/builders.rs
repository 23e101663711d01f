// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Builder for managers on a manual clock.
//!
//! Integration tests advance time explicitly; nothing here sleeps.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use warden_auth::Manager;
use warden_core::{Config, GroupSpec, ManualClock, MessageCatalog};

/// Fluent construction of a test manager plus the clock that drives it.
#[derive(Debug, Default)]
pub struct ManagerBuilder {
    config: Option<Config>,
    groups: Vec<GroupSpec>,
    catalog: Option<MessageCatalog>,
}

impl ManagerBuilder {
    /// Creates a builder with the default configuration and no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds a group definition.
    pub fn group(mut self, spec: GroupSpec) -> Self {
        self.groups.push(spec);
        self
    }

    /// Adds several group definitions.
    pub fn groups(mut self, specs: impl IntoIterator<Item = GroupSpec>) -> Self {
        self.groups.extend(specs);
        self
    }

    /// Sets a custom message catalog.
    pub fn catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds a `()`-payload manager.
    ///
    /// # Panics
    /// Panics on invalid configuration or groups — test setup errors should
    /// fail loudly.
    pub fn build(self) -> (Manager<()>, Arc<ManualClock>) {
        self.build_with_payload::<()>()
    }

    /// Builds a manager with a custom payload type.
    pub fn build_with_payload<T>(self) -> (Manager<T>, Arc<ManualClock>)
    where
        T: Clone + Default + Serialize + DeserializeOwned,
    {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = Manager::with_clock(
            self.config.unwrap_or_default(),
            self.groups,
            self.catalog.unwrap_or_default(),
            clock.clone(),
        )
        .expect("test manager construction failed");
        (manager, clock)
    }
}
