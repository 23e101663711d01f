// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Opaque token key generation and validation.
//!
//! Keys carry no signed claims; they are high-entropy identifiers. Each key
//! is the URL-safe base64 encoding of 32 bytes: an 8-byte little-endian
//! nanosecond timestamp followed by 24 bytes of OS randomness. The timestamp
//! prefix keeps keys roughly sortable by issuance time in dumps without
//! weakening the random tail.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use warden_core::{ErrorCode, WardenResult};

/// Random bytes per key.
pub const RANDOM_BYTES: usize = 24;
/// Timestamp prefix bytes per key.
pub const TIMESTAMP_BYTES: usize = 8;

/// Minimum accepted key length in characters.
const MIN_KEY_CHARS: usize = 16;
/// Maximum accepted key length in characters.
const MAX_KEY_CHARS: usize = 1_024;
/// Minimum accepted decoded length in bytes.
const MIN_KEY_BYTES: usize = 16;
/// Maximum accepted decoded length in bytes.
const MAX_KEY_BYTES: usize = 256;

/// Generates a fresh token key.
///
/// An RNG failure is reported as [`ErrorCode::TokenGenerate`]; it fails the
/// calling operation but leaves the manager usable.
pub fn generate_token_key(now: DateTime<Utc>) -> WardenResult<String> {
    let mut raw = [0u8; TIMESTAMP_BYTES + RANDOM_BYTES];

    let nanos = now.timestamp_nanos_opt().unwrap_or_default();
    raw[..TIMESTAMP_BYTES].copy_from_slice(&nanos.to_le_bytes());

    OsRng
        .try_fill_bytes(&mut raw[TIMESTAMP_BYTES..])
        .map_err(|_| ErrorCode::TokenGenerate)?;

    Ok(URL_SAFE.encode(raw))
}

/// Checks that a key is well formed: non-empty, 16–1024 characters, decodes
/// as URL-safe base64, and decodes to 16–256 bytes.
///
/// This is a shape check only — it says nothing about whether the key is
/// stored or live.
pub fn validate_token_key(key: &str) -> bool {
    if !(MIN_KEY_CHARS..=MAX_KEY_CHARS).contains(&key.len()) {
        return false;
    }
    match URL_SAFE.decode(key) {
        Ok(raw) => (MIN_KEY_BYTES..=MAX_KEY_BYTES).contains(&raw.len()),
        Err(_) => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
