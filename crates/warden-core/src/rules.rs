// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Compilation of human-authored group definitions into sorted rule vectors.
//!
//! The sort establishes the total order the matcher relies on: longer rules
//! first, then more specific segments, with wildcards sinking behind concrete
//! segments of the same length. The sort is stable, so original textual order
//! survives as the final tie-breaker.

use std::cmp::Ordering;

use crate::config::Config;
use crate::duration::{is_well_formed_duration, parse_duration};
use crate::error::{ErrorCode, WardenResult};
use crate::path::parse_path_segments;
use crate::types::{ApiRule, Group, GroupSpec, RuleAction};

// =============================================================================
// Compilation
// =============================================================================

/// Compiles a [`GroupSpec`] into a [`Group`] with a canonically sorted rule
/// vector.
///
/// The allow and deny strings are split on `delimiter`; each fragment is
/// trimmed and parsed into path segments, and empty fragments are dropped.
/// Compilation never fails — validation is a separate, earlier step
/// ([`validate_group_spec`]).
pub fn compile_group(spec: &GroupSpec, delimiter: &str) -> Group {
    let mut rules = Vec::new();

    for path in split_fragments(&spec.allowed_apis, delimiter) {
        rules.push(ApiRule::new(path, RuleAction::Allow));
    }
    for path in split_fragments(&spec.denied_apis, delimiter) {
        rules.push(ApiRule::new(path, RuleAction::Deny));
    }

    sort_rules(&mut rules);

    Group {
        name: spec.name.clone(),
        api_rules: rules,
        expire_seconds: parse_duration(&spec.token_expire),
        allow_multiple_login: spec.allow_multiple_login == 1,
    }
}

fn split_fragments(input: &str, delimiter: &str) -> Vec<Vec<String>> {
    input
        .split(delimiter)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(parse_path_segments)
        .filter(|segments| !segments.is_empty())
        .collect()
}

// =============================================================================
// Rule Ordering
// =============================================================================

/// Sorts rules by descending priority.
///
/// Priority order:
/// 1. Longer paths first.
/// 2. For equal lengths, segment-by-segment: a `*` segment ranks below any
///    concrete segment, longer segment strings rank higher, and equal-length
///    strings compare lexicographically (smaller first).
/// 3. Remaining ties keep input order (the sort is stable).
///
/// This guarantees the matcher's longest-prefix choice is also the most
/// specific choice, and that wildcards never shadow concrete routes.
pub fn sort_rules(rules: &mut [ApiRule]) {
    rules.sort_by(rule_priority);
}

fn rule_priority(a: &ApiRule, b: &ApiRule) -> Ordering {
    b.path
        .len()
        .cmp(&a.path.len())
        .then_with(|| {
            a.path
                .iter()
                .zip(&b.path)
                .map(|(x, y)| segment_priority(x, y))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
}

fn segment_priority(a: &str, b: &str) -> Ordering {
    match (a == "*", b == "*") {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b.len().cmp(&a.len()).then_with(|| a.cmp(b)),
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a host-supplied group definition against the configuration.
///
/// Checks: non-zero id, non-blank name, well-formed `token_expire`,
/// `allow_multiple_login` restricted to `0`/`1`, and — when the parsed
/// lifetime is non-zero — containment in the configured
/// `[min_token_expire, max_token_expire]` window.
pub fn validate_group_spec(spec: &GroupSpec, config: &Config) -> WardenResult<()> {
    if spec.id == 0 {
        return Err(ErrorCode::GroupInvalid);
    }
    if spec.name.trim().is_empty() {
        return Err(ErrorCode::GroupInvalid);
    }
    if !is_well_formed_duration(&spec.token_expire) {
        return Err(ErrorCode::GroupInvalid);
    }
    if !matches!(spec.allow_multiple_login, 0 | 1) {
        return Err(ErrorCode::GroupInvalid);
    }

    let expire = parse_duration(&spec.token_expire);
    if expire != 0 && !(config.min_token_expire..=config.max_token_expire).contains(&expire) {
        return Err(ErrorCode::GroupInvalid);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
