// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Session persistence.
//!
//! A session folder holds the committed document (`diagram.xml`) and a
//! small JSON meta sidecar. Saving is decoupled from the commit path by
//! [`DebouncedWriter`]: snapshots are scheduled latest-wins onto a
//! background worker, write failures are logged and retried on the next
//! natural save trigger, and a failed save is never a document-validity
//! error.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::format::mxgraph::{parse_document, DocumentParseError};
use crate::model::{Document, IdError, SessionId};

const DOCUMENT_FILENAME: &str = "diagram.xml";
const SESSION_META_FILENAME: &str = "proteus-session.meta.json";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    DocumentParse {
        path: PathBuf,
        source: DocumentParseError,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {}: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "invalid json at {}: {source}", path.display())
            }
            Self::DocumentParse { path, source } => {
                write!(f, "invalid document at {}: {source}", path.display())
            }
            Self::InvalidId { field, value, source } => {
                write!(f, "invalid {field} {value:?}: {source}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::DocumentParse { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence: temp file + atomic rename, no
    /// per-file fsync.
    #[default]
    BestEffort,
    /// Slower persistence with fsync/sync where supported.
    Durable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    pub session_id: SessionId,
    pub rev: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionMetaJson {
    session_id: String,
    rev: u64,
}

/// A loaded session: the committed document with its persisted revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSession {
    pub session_id: SessionId,
    pub document: Document,
}

#[derive(Debug, Clone)]
pub struct SessionFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl SessionFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join(DOCUMENT_FILENAME)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.root.join(SESSION_META_FILENAME)
    }

    /// Load the persisted session, or initialize a fresh one with the
    /// two-sentinel empty document when the folder has no document yet.
    pub fn load_or_init(&self, session_id: &SessionId) -> Result<LoadedSession, StoreError> {
        let document_path = self.document_path();
        let xml = match fs::read_to_string(&document_path) {
            Ok(xml) => xml,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LoadedSession {
                    session_id: session_id.clone(),
                    document: Document::empty(),
                });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: document_path,
                    source,
                })
            }
        };

        let mut document =
            parse_document(&xml).map_err(|source| StoreError::DocumentParse {
                path: document_path,
                source,
            })?;

        let meta = self.load_meta()?;
        let session_id = match &meta {
            Some(meta) => {
                document.set_rev(meta.rev);
                meta.session_id.clone()
            }
            None => session_id.clone(),
        };

        Ok(LoadedSession {
            session_id,
            document,
        })
    }

    pub fn load_meta(&self) -> Result<Option<SessionMeta>, StoreError> {
        let meta_path = self.meta_path();
        let meta_str = match fs::read_to_string(&meta_path) {
            Ok(meta_str) => meta_str,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: meta_path,
                    source,
                })
            }
        };
        let meta_json: SessionMetaJson =
            serde_json::from_str(&meta_str).map_err(|source| StoreError::Json {
                path: meta_path.clone(),
                source,
            })?;
        let session_id =
            SessionId::new(&meta_json.session_id).map_err(|source| StoreError::InvalidId {
                field: "session_id",
                value: meta_json.session_id.clone(),
                source,
            })?;
        Ok(Some(SessionMeta {
            session_id,
            rev: meta_json.rev,
        }))
    }

    /// Persist the committed document and its meta sidecar atomically
    /// (temp file + rename, each).
    pub fn save(&self, session_id: &SessionId, document: &Document) -> Result<(), StoreError> {
        let xml = document.to_xml();
        self.write_atomic(&self.document_path(), xml.as_bytes())?;

        let meta_json = SessionMetaJson {
            session_id: session_id.as_str().to_owned(),
            rev: document.rev(),
        };
        let meta_path = self.meta_path();
        let meta_str =
            serde_json::to_string_pretty(&meta_json).map_err(|source| StoreError::Json {
                path: meta_path.clone(),
                source,
            })?;
        self.write_atomic(&meta_path, meta_str.as_bytes())
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let Some(file_name) = path.file_name() else {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("path has no file name"),
            });
        };
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tmp_path = self.root.join(format!(
            ".proteus.tmp.{}.{nanos}",
            file_name.to_string_lossy()
        ));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        file.write_all(contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        if self.durability == WriteDurability::Durable {
            file.sync_all().map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }
        drop(file);

        if let Err(source) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

/// One scheduled save: a full snapshot of what should end up on disk.
#[derive(Debug, Clone)]
struct SaveTask {
    folder: SessionFolder,
    session_id: SessionId,
    document: Document,
}

#[derive(Debug, Default)]
struct WriterState {
    pending: Option<SaveTask>,
    in_flight: bool,
}

#[derive(Debug)]
struct WriterInner {
    state: Mutex<WriterState>,
    cv: Condvar,
}

/// Background save worker with latest-wins coalescing: scheduling while a
/// save is pending replaces the pending snapshot, never queues a second
/// one. `flush` blocks until the folder is quiet.
#[derive(Debug, Clone)]
pub struct DebouncedWriter {
    inner: Arc<WriterInner>,
}

impl Default for DebouncedWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DebouncedWriter {
    pub fn new() -> Self {
        let inner = Arc::new(WriterInner {
            state: Mutex::new(WriterState::default()),
            cv: Condvar::new(),
        });

        std::thread::Builder::new()
            .name("proteus-session-save".to_owned())
            .spawn({
                let inner = Arc::downgrade(&inner);
                move || Self::run_worker(inner)
            })
            .expect("spawn session save worker thread");

        Self { inner }
    }

    pub fn schedule(&self, folder: SessionFolder, session_id: SessionId, document: Document) {
        let mut state = self.inner.state.lock().expect("session save lock poisoned");
        state.pending = Some(SaveTask {
            folder,
            session_id,
            document,
        });
        self.inner.cv.notify_one();
    }

    /// Wait until the pending snapshot (if any) has been written.
    pub fn flush(&self) {
        let mut state = self.inner.state.lock().expect("session save lock poisoned");
        while state.pending.is_some() || state.in_flight {
            state = self
                .inner
                .cv
                .wait(state)
                .expect("session save cv poisoned");
        }
    }

    fn run_worker(weak: std::sync::Weak<WriterInner>) {
        loop {
            // Re-upgrade each round so the worker exits once every writer
            // handle is gone; the timed wait bounds how long that takes.
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let task = {
                let mut state = inner.state.lock().expect("session save lock poisoned");
                if state.pending.is_none() {
                    let (next, _timeout) = inner
                        .cv
                        .wait_timeout(state, std::time::Duration::from_millis(500))
                        .expect("session save cv poisoned");
                    state = next;
                }
                match state.pending.take() {
                    Some(task) => {
                        state.in_flight = true;
                        task
                    }
                    None => continue,
                }
            };

            if let Err(err) = task.folder.save(&task.session_id, &task.document) {
                // Fire-and-forget: the next natural save trigger retries.
                tracing::warn!(session_id = %task.session_id, error = %err, "session save failed");
            }

            let mut state = inner.state.lock().expect("session save lock poisoned");
            state.in_flight = false;
            inner.cv.notify_all();
        }
    }
}

#[cfg(test)]
mod tests;
