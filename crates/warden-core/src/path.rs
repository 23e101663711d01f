// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-path segmentation and longest-prefix rule matching.
//!
//! This is the innermost piece of the authorization engine: pure functions
//! over segment lists, no locking, no allocation beyond the parsed segments.

use crate::types::ApiRule;

// =============================================================================
// Path Parsing
// =============================================================================

/// Splits a path string into non-empty, trimmed segments.
///
/// Consecutive slashes collapse and surrounding whitespace per segment is
/// dropped, so `"/api//user/"`, `"api/user"` and `" /api / user "` all parse
/// to `["api", "user"]`. A root or empty path yields an empty vector.
pub fn parse_path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the path component of a request URL and splits it into segments.
///
/// Accepts a full `scheme://host/path?query#frag` form, a bare path with or
/// without a leading slash, or anything in between. Query strings and
/// fragments are discarded.
pub fn parse_url_segments(url: &str) -> Vec<String> {
    let mut s = url;

    if let Some(idx) = s.find('#') {
        s = &s[..idx];
    }
    if let Some(idx) = s.find('?') {
        s = &s[..idx];
    }
    if let Some(idx) = s.find("://") {
        let rest = &s[idx + 3..];
        s = match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => "",
        };
    }

    parse_path_segments(s)
}

// =============================================================================
// Longest-Prefix Matching
// =============================================================================

/// Decides whether a parsed request is permitted by a pre-sorted rule list.
///
/// A rule applies when its entire path is a leading prefix of the request.
/// Among applicable rules the longest wins; equal lengths are broken by the
/// rule vector's existing order (first wins, which is why the compiler's sort
/// must be stable). No applicable rule means deny, and an empty request is
/// always denied.
///
/// A `*` rule segment matches only the literal request segment `"*"`; rule
/// priority is the only place wildcards are special.
pub fn check_permission(request: &[String], rules: &[ApiRule]) -> bool {
    if request.is_empty() {
        return false;
    }

    let mut best: Option<&ApiRule> = None;
    let mut best_len = 0usize;

    for rule in rules {
        if rule.path.is_empty() || rule.path.len() > request.len() {
            continue;
        }
        let matched = rule
            .path
            .iter()
            .zip(request)
            .take_while(|(rule_seg, req_seg)| rule_seg == req_seg)
            .count();
        if matched == rule.path.len() && rule.path.len() > best_len {
            best_len = rule.path.len();
            best = Some(rule);
        }
    }

    best.map(|rule| rule.rule.is_allow()).unwrap_or(false)
}

/// Parses a request URL and checks it against a pre-sorted rule list.
pub fn has_permission(url: &str, rules: &[ApiRule]) -> bool {
    check_permission(&parse_url_segments(url), rules)
}

// =============================================================================
// Tests
// =============================================================================
