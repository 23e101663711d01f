// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared test utilities.
//!
//! - `fixtures`: pre-built groups and configurations shaped after the
//!   policies the end-to-end scenarios need
//! - `builders`: fluent construction of managers on a manual clock, so tests
//!   advance time instead of sleeping

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initializes test logging once per process. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| {
                        EnvFilter::new("warn,warden_core=debug,warden_store=debug,warden_auth=debug")
                    }),
            )
            .with_test_writer()
            .init();
    });
}
