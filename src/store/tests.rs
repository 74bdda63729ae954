// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{DebouncedWriter, SessionFolder, StoreError};
use crate::model::fixtures::small_document;
use crate::model::SessionId;

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!(
            "proteus-{prefix}-{}-{nanos}-{counter}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct SessionFolderTestCtx {
    tmp: TempDir,
    folder: SessionFolder,
}

impl SessionFolderTestCtx {
    fn new(prefix: &str) -> Self {
        let tmp = TempDir::new(prefix);
        let folder = SessionFolder::new(tmp.path().join("my-session"));
        Self { tmp, folder }
    }
}

#[fixture]
fn ctx() -> SessionFolderTestCtx {
    SessionFolderTestCtx::new("session-folder")
}

fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

#[rstest]
fn load_or_init_synthesizes_an_empty_document(ctx: SessionFolderTestCtx) {
    let loaded = ctx.folder.load_or_init(&sid("s1")).expect("load");

    assert_eq!(loaded.session_id, sid("s1"));
    assert_eq!(loaded.document.len(), 2);
    assert_eq!(loaded.document.rev(), 0);
}

#[rstest]
fn save_then_load_round_trips_document_and_rev(ctx: SessionFolderTestCtx) {
    let mut document = small_document();
    document.set_rev(5);

    ctx.folder.save(&sid("s1"), &document).expect("save");
    let loaded = ctx.folder.load_or_init(&sid("ignored")).expect("load");

    assert_eq!(loaded.session_id, sid("s1"));
    assert_eq!(loaded.document.rev(), 5);
    assert_eq!(loaded.document.cells(), document.cells());
}

#[rstest]
fn corrupt_document_surfaces_a_parse_error(ctx: SessionFolderTestCtx) {
    std::fs::create_dir_all(ctx.folder.root()).unwrap();
    std::fs::write(ctx.folder.document_path(), "<mxGraphModel><root>").unwrap();

    let result = ctx.folder.load_or_init(&sid("s1"));
    assert!(matches!(result, Err(StoreError::DocumentParse { .. })));
}

#[rstest]
fn corrupt_meta_surfaces_a_json_error(ctx: SessionFolderTestCtx) {
    ctx.folder.save(&sid("s1"), &small_document()).expect("save");
    std::fs::write(ctx.folder.meta_path(), "{ not json").unwrap();

    let result = ctx.folder.load_or_init(&sid("s1"));
    assert!(matches!(result, Err(StoreError::Json { .. })));
}

#[rstest]
fn save_leaves_no_temp_files_behind(ctx: SessionFolderTestCtx) {
    ctx.folder.save(&sid("s1"), &small_document()).expect("save");

    let leftovers: Vec<_> = std::fs::read_dir(ctx.folder.root())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[rstest]
fn debounced_writer_persists_the_latest_snapshot(ctx: SessionFolderTestCtx) {
    let writer = DebouncedWriter::new();

    let mut first = small_document();
    first.set_rev(1);
    let mut second = small_document();
    second.set_rev(2);

    writer.schedule(ctx.folder.clone(), sid("s1"), first);
    writer.schedule(ctx.folder.clone(), sid("s1"), second);
    writer.flush();

    let loaded = ctx.folder.load_or_init(&sid("s1")).expect("load");
    assert_eq!(loaded.document.rev(), 2);
}

#[rstest]
fn debounced_writer_failure_is_not_fatal(ctx: SessionFolderTestCtx) {
    let writer = DebouncedWriter::new();

    // A root that cannot be created: a regular file stands in its way.
    std::fs::create_dir_all(ctx.tmp.path()).unwrap();
    let blocked = ctx.tmp.path().join("blocked");
    std::fs::write(&blocked, b"file").unwrap();
    let bad_folder = SessionFolder::new(blocked.join("nested"));

    writer.schedule(bad_folder, sid("s1"), small_document());
    writer.flush();

    // The worker survives and later saves still succeed.
    writer.schedule(ctx.folder.clone(), sid("s1"), small_document());
    writer.flush();
    assert!(ctx.folder.document_path().exists());
}
