// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Snapshot persistence.
//!
//! The snapshot is a single JSON object `{ "tokens": ..., "stats": ... }`.
//! Loading is tolerant: a missing file means "start empty" and a malformed
//! one is reported but never aborts initialization. Writes are atomic
//! (write-to-temp, rename) and run on a dedicated worker thread so the hot
//! path never blocks on the filesystem; serialization itself happens on the
//! caller's thread, outside the manager lock, so the worker only ever handles
//! opaque byte payloads.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use warden_core::{ErrorCode, Stats, Token, WardenResult};

// =============================================================================
// Snapshot Data
// =============================================================================

/// On-disk snapshot contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// All stored tokens, keyed by token key.
    pub tokens: HashMap<String, Token<T>>,
    /// Counters as of the capture.
    pub stats: Stats,
}

/// Loads a snapshot from `path`.
///
/// Returns `Ok(None)` when the file does not exist. Read failures map to
/// [`ErrorCode::CacheLoadFail`] and parse failures to
/// [`ErrorCode::CacheParseFail`]; callers are expected to log and start
/// empty rather than propagate either.
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> WardenResult<Option<Snapshot<T>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(_) => return Err(ErrorCode::CacheLoadFail),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|_| ErrorCode::CacheParseFail)
}

/// Writes `payload` to `path` atomically: the bytes land in a temporary file
/// in the target directory and are renamed into place.
pub fn write_snapshot_atomic(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }

    let mut file = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))?;
    file.write_all(payload)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

// =============================================================================
// SnapshotWriter
// =============================================================================

enum WriterCommand {
    Write(Vec<u8>),
    Shutdown,
}

/// A single background thread that applies snapshot payloads to disk.
///
/// Submissions are queued; dropping the writer drains whatever is queued and
/// joins the thread, so process shutdown never abandons an in-flight write.
/// Write failures are logged and swallowed — persistence is best-effort on
/// the hot path.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: mpsc::Sender<WriterCommand>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    /// Spawns the worker for the given snapshot path.
    pub fn spawn(path: PathBuf) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<WriterCommand>();

        let handle = thread::Builder::new()
            .name("warden-snapshot".to_string())
            .spawn(move || {
                // Commands arrive in order, so queued writes are applied
                // before a shutdown is observed.
                while let Ok(command) = rx.recv() {
                    match command {
                        WriterCommand::Write(payload) => {
                            match write_snapshot_atomic(&path, &payload) {
                                Ok(()) => {
                                    debug!(path = %path.display(), bytes = payload.len(), "snapshot written")
                                }
                                Err(err) => {
                                    warn!(path = %path.display(), error = %err, "snapshot write failed")
                                }
                            }
                        }
                        WriterCommand::Shutdown => break,
                    }
                }
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Queues a serialized snapshot for writing.
    pub fn submit(&self, payload: Vec<u8>) {
        if self.tx.send(WriterCommand::Write(payload)).is_err() {
            warn!("snapshot writer is gone; dropping snapshot");
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(WriterCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
