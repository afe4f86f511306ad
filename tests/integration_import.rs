//! Integration tests for the import pipeline.
//!
//! These tests verify end-to-end import behavior including:
//! - Date-based placement and re-run idempotence
//! - Duplicate handling in copy and move mode
//! - Each conflict policy
//! - Dry runs and cancellation

mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::{fingerprint_of, jpeg};
use exisort::core::cancel::CancellationToken;
use exisort::core::import::{
    ConflictPolicy, ImportPipeline, ImportPipelineBuilder, RunStatus, TransferMode,
};
use chrono::NaiveDateTime;
use exisort::core::metadata::MetadataFallback;
use exisort::error::ImportError;
use exisort::events::null_sender;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const MAY_10: &str = "2023:05:10 14:22:31";
const MAY_10_TARGET: &str = "2023/2023-05/20230510_142231.jpg";

fn assert_content(file: &impl AsRef<Path>, expected: Vec<u8>) {
    assert_eq!(fs::read(file.as_ref()).unwrap(), expected);
}

fn import(source: &Path, destination: &Path) -> ImportPipelineBuilder {
    ImportPipeline::builder()
        .source(source)
        .destination(destination)
        .min_size(0)
}

#[test]
fn sorts_by_capture_date() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("DCIM/IMG_0001.jpg")
        .write_binary(&jpeg(MAY_10, b"one"))
        .unwrap();
    src.child("DCIM/IMG_0002.JPG")
        .write_binary(&jpeg("2024:01:02 03:04:05", b"two"))
        .unwrap();
    src.child("notes.txt").write_str("not media").unwrap();

    let report = import(src.path(), dst.path())
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stats.files_scanned, 2);
    assert_eq!(report.stats.files_processed, 2);
    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"one"));
    dst.child("2024/2024-01/20240102_030405.JPG")
        .assert(predicate::path::is_file());
    dst.child("notes.txt").assert(predicate::path::missing());
    src.child("DCIM/IMG_0001.jpg").assert(predicate::path::exists());
}

#[test]
fn rerun_reports_every_file_as_duplicate() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"a")).unwrap();
    src.child("b.jpg")
        .write_binary(&jpeg("2023:06:01 10:00:00", b"b"))
        .unwrap();

    let pipeline = import(src.path(), dst.path()).build().unwrap();
    let first = pipeline.run_to_end().unwrap();
    let second = pipeline.run_to_end().unwrap();

    assert_eq!(first.stats.files_processed, 2);
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(second.stats.duplicates, 2);
    assert_eq!(second.stats.errors, 0);
}

#[test]
fn move_mode_duplicate_deletes_source() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"same")).unwrap();
    dst.child(MAY_10_TARGET)
        .write_binary(&jpeg(MAY_10, b"same"))
        .unwrap();

    let report = import(src.path(), dst.path())
        .mode(TransferMode::Move)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.duplicates, 1);
    assert_eq!(report.stats.files_processed, 0);
    src.child("a.jpg").assert(predicate::path::missing());
    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"same"));
}

#[test]
fn copy_mode_duplicate_keeps_source() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"same")).unwrap();
    dst.child(MAY_10_TARGET)
        .write_binary(&jpeg(MAY_10, b"same"))
        .unwrap();

    let report = import(src.path(), dst.path())
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.duplicates, 1);
    src.child("a.jpg").assert(predicate::path::exists());
}

#[test]
fn rename_keeps_both_files() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    let source = src.child("a.jpg");
    source.write_binary(&jpeg(MAY_10, b"newcomer")).unwrap();
    dst.child(MAY_10_TARGET)
        .write_binary(&jpeg(MAY_10, b"resident"))
        .unwrap();
    let fp = fingerprint_of(source.path());

    import(src.path(), dst.path())
        .conflict(ConflictPolicy::Rename)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"resident"));
    assert_content(
        &dst.child(format!("2023/2023-05/20230510_142231_{fp}.jpg")),
        jpeg(MAY_10, b"newcomer"),
    );
}

#[test]
fn deep_check_walks_the_counter_chain() {
    // Same size and same first 64 KiB: equal fingerprints, different content
    let body = |last: u8| {
        let mut data = jpeg(MAY_10, &vec![0u8; 80 * 1024]);
        if let Some(byte) = data.last_mut() {
            *byte = last;
        }
        data
    };

    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&body(1)).unwrap();
    src.child("b.jpg").write_binary(&body(2)).unwrap();
    src.child("c.jpg").write_binary(&body(3)).unwrap();
    let fp = fingerprint_of(src.child("a.jpg").path());
    assert_eq!(fp, fingerprint_of(src.child("c.jpg").path()));

    let report = import(src.path(), dst.path())
        .deep_check(true)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.files_processed, 3);
    assert_content(&dst.child(MAY_10_TARGET), body(1));
    assert_content(&dst.child(format!("2023/2023-05/20230510_142231_{fp}.jpg")), body(2));
    assert_content(&dst.child(format!("2023/2023-05/20230510_142231_{fp}_1.jpg")), body(3));
}

#[test]
fn skip_leaves_both_files() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg")
        .write_binary(&jpeg(MAY_10, b"newcomer"))
        .unwrap();
    dst.child(MAY_10_TARGET)
        .write_binary(&jpeg(MAY_10, b"resident"))
        .unwrap();

    let report = import(src.path(), dst.path())
        .mode(TransferMode::Move)
        .conflict(ConflictPolicy::Skip)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.files_processed, 0);
    assert_content(&src.child("a.jpg"), jpeg(MAY_10, b"newcomer"));
    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"resident"));
}

#[test]
fn overwrite_replaces_existing_file() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg")
        .write_binary(&jpeg(MAY_10, b"newcomer"))
        .unwrap();
    dst.child(MAY_10_TARGET)
        .write_binary(&jpeg(MAY_10, b"resident"))
        .unwrap();

    let report = import(src.path(), dst.path())
        .conflict(ConflictPolicy::Overwrite)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.files_processed, 1);
    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"newcomer"));
}

#[test]
fn dry_run_mutates_nothing() {
    let src = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let dst = root.child("library");
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"a")).unwrap();

    let report = import(src.path(), dst.path())
        .mode(TransferMode::Move)
        .dry_run(true)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.stats.files_processed, 1);
    dst.assert(predicate::path::missing());
    assert_content(&src.child("a.jpg"), jpeg(MAY_10, b"a"));
}

#[test]
fn files_below_min_size_are_ignored() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"a")).unwrap();

    let report = import(src.path(), dst.path())
        .min_size(32 * 1024)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.files_scanned, 0);
    assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 0);
}

#[test]
fn cancelled_run_is_interrupted_not_failed() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"a")).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let report = import(src.path(), dst.path())
        .build()
        .unwrap()
        .run(&token, &null_sender())
        .unwrap();

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.stats.files_processed, 0);
    dst.child(MAY_10_TARGET).assert(predicate::path::missing());
    src.child("a.jpg").assert(predicate::path::exists());
}

/// Cancels the run once `placed` exists
struct CancelAfter {
    token: CancellationToken,
    placed: PathBuf,
}

impl MetadataFallback for CancelAfter {
    fn fetch(&self, _path: &Path) -> Option<NaiveDateTime> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !self.placed.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        self.token.cancel();
        None
    }
}

#[test]
fn interrupt_after_first_transfer_keeps_it() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    src.child("a.jpg").write_binary(&jpeg(MAY_10, b"a")).unwrap();
    src.child("b.mov").write_binary(b"no container here").unwrap();
    src.child("c.jpg")
        .write_binary(&jpeg("2023:06:01 10:00:00", b"c"))
        .unwrap();

    let token = CancellationToken::new();
    let report = import(src.path(), dst.path())
        .mode(TransferMode::Move)
        .fallback(Arc::new(CancelAfter {
            token: token.clone(),
            placed: dst.child(MAY_10_TARGET).path().to_path_buf(),
        }))
        .build()
        .unwrap()
        .run(&token, &null_sender())
        .unwrap();

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.stats.files_processed, 1);
    assert_content(&dst.child(MAY_10_TARGET), jpeg(MAY_10, b"a"));
    dst.child("2023/2023-06/20230601_100000.jpg")
        .assert(predicate::path::missing());
    src.child("b.mov").assert(predicate::path::exists());
    src.child("c.jpg").assert(predicate::path::exists());
}

#[test]
fn library_inside_the_card_is_left_alone() {
    let card = TempDir::new().unwrap();
    for day in 1..=5 {
        card.child(format!("IMG_{day}.jpg"))
            .write_binary(&jpeg(&format!("2023:05:{day:02} 09:00:00"), b"x"))
            .unwrap();
    }

    let report = import(card.path(), &card.path().join("library"))
        .mode(TransferMode::Move)
        .queue_capacity(1)
        .build()
        .unwrap()
        .run_to_end()
        .unwrap();

    assert_eq!(report.stats.files_scanned, 5);
    assert_eq!(report.stats.files_processed, 5);
    assert_eq!(report.stats.duplicates, 0);
    card.child("library/2023/2023-05/20230505_090000.jpg")
        .assert(predicate::path::is_file());
}

#[test]
fn unusable_destination_is_fatal() {
    let src = TempDir::new().unwrap();
    let blocker = src.child("file-not-dir");
    blocker.write_str("x").unwrap();

    let result = import(src.path(), &blocker.path().join("library"))
        .build()
        .unwrap()
        .run_to_end();

    assert!(matches!(
        result,
        Err(ImportError::DestinationUnavailable { .. })
    ));
}
