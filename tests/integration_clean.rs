//! Integration tests for clean mode.

mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::jpeg;
use exisort::core::clean::{CleanAction, CleanConfig, Cleaner, KeepPolicy};
use exisort::core::import::{ImportPipeline, RunStatus, TransferMode};
use exisort::error::CleanError;
use predicates::prelude::*;
use std::path::Path;

fn config(root: &Path, keep: KeepPolicy, action: CleanAction) -> CleanConfig {
    CleanConfig {
        root: root.to_path_buf(),
        keep,
        action,
        min_size: 0,
        ..Default::default()
    }
}

#[test]
fn shortest_path_survives_delete() {
    let lib = TempDir::new().unwrap();
    let photo = jpeg("2023:05:10 14:22:31", b"x");
    lib.child("a.jpg").write_binary(&photo).unwrap();
    lib.child("copies/a.jpg").write_binary(&photo).unwrap();
    lib.child("copies/deeper/a (1).jpg")
        .write_binary(&photo)
        .unwrap();
    lib.child("unique.jpg")
        .write_binary(&jpeg("2023:05:10 14:22:31", b"y"))
        .unwrap();

    let report = Cleaner::new(config(
        lib.path(),
        KeepPolicy::ShortestPath,
        CleanAction::Delete,
    ))
    .run_to_end()
    .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.stats.files_processed, 2);
    lib.child("a.jpg").assert(predicate::path::exists());
    lib.child("unique.jpg").assert(predicate::path::exists());
    lib.child("copies/a.jpg").assert(predicate::path::missing());
    lib.child("copies/deeper/a (1).jpg")
        .assert(predicate::path::missing());
}

#[test]
fn every_identical_group_keeps_exactly_one() {
    let lib = TempDir::new().unwrap();
    for (group, copies) in [("p", 2), ("q", 3), ("r", 4)] {
        let photo = jpeg("2022:01:01 00:00:00", group.as_bytes());
        for i in 0..copies {
            lib.child(format!("{group}/{i}.jpg"))
                .write_binary(&photo)
                .unwrap();
        }
    }

    let trash = TempDir::new().unwrap();
    let report = Cleaner::new(config(
        lib.path(),
        KeepPolicy::Oldest,
        CleanAction::Trash(trash.path().to_path_buf()),
    ))
    .run_to_end()
    .unwrap();

    assert_eq!(report.groups.len(), 3);
    assert_eq!(report.stats.duplicates, 1 + 2 + 3);
    for group in ["p", "q", "r"] {
        let left = std::fs::read_dir(lib.child(group).path()).unwrap().count();
        assert_eq!(left, 1, "group {group}");
    }
    assert_eq!(std::fs::read_dir(trash.path()).unwrap().count(), 6);
}

#[test]
fn clean_finds_nothing_after_import() {
    let src = TempDir::new().unwrap();
    let lib = TempDir::new().unwrap();
    let photo = jpeg("2023:05:10 14:22:31", b"x");
    src.child("card1/IMG_0001.jpg").write_binary(&photo).unwrap();
    src.child("card2/IMG_0001.jpg").write_binary(&photo).unwrap();

    let imported = ImportPipeline::builder()
        .source(src.path())
        .destination(lib.path())
        .mode(TransferMode::Copy)
        .min_size(0)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();
    assert_eq!(imported.stats.files_processed, 1);
    assert_eq!(imported.stats.duplicates, 1);

    let report = Cleaner::new(config(lib.path(), KeepPolicy::Oldest, CleanAction::Report))
        .run_to_end()
        .unwrap();
    assert!(report.groups.is_empty());

    let source_side = Cleaner::new(config(src.path(), KeepPolicy::Oldest, CleanAction::Report))
        .run_to_end()
        .unwrap();
    assert_eq!(source_side.groups.len(), 1);
}

#[test]
fn missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let result = Cleaner::new(config(
        &temp.path().join("missing"),
        KeepPolicy::Oldest,
        CleanAction::Report,
    ))
    .run_to_end();

    assert!(matches!(result, Err(CleanError::RootNotFound { .. })));
}
