//! Duplicate grouping and the actions taken on redundant copies.

use super::types::*;
use crate::core::cancel::CancellationToken;
use crate::core::fingerprint::full_hash;
use crate::core::import::RunStatus;
use crate::core::scanner::{MediaFile, MediaFilter, ScanConfig, WalkDirScanner};
use crate::core::stats::Statistics;
use crate::error::CleanError;
use crate::events::{null_sender, CleanEvent, Event, EventSender, PipelineEvent, PipelinePhase};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Finds byte-identical media under one root and thins each group to a
/// single keeper
pub struct Cleaner {
    config: CleanConfig,
}

impl Cleaner {
    pub fn new(config: CleanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Run to completion without events or cancellation
    pub fn run_to_end(&self) -> Result<CleanReport, CleanError> {
        self.run(&CancellationToken::new(), &null_sender())
    }

    /// Scan, group and act. Cancellation is honoured between files; a
    /// cancelled run reports what it found so far.
    pub fn run(
        &self,
        token: &CancellationToken,
        events: &EventSender,
    ) -> Result<CleanReport, CleanError> {
        if let Err(e) = self.prepare() {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
            return Err(e);
        }

        tracing::info!(
            root = %self.config.root.display(),
            keep = ?self.config.keep,
            action = self.config.action.label(),
            dry_run = self.config.dry_run,
            "Starting clean"
        );
        events.send(Event::Pipeline(PipelineEvent::Started {
            phase: PipelinePhase::Cleaning,
        }));

        let stats = Statistics::new();
        let files = self.collect(token, &stats, events);
        let groups = self.group(files, token, &stats, events);

        'groups: for group in &groups {
            events.send(Event::Clean(CleanEvent::GroupFound {
                keeper: group.keeper.clone(),
                duplicates: group.duplicates.clone(),
            }));
            for duplicate in &group.duplicates {
                if token.is_cancelled() {
                    break 'groups;
                }
                stats.record_duplicate();
                self.act(duplicate, group.size, &stats, events);
            }
        }

        let snapshot = stats.snapshot();
        let status = if token.is_cancelled() {
            tracing::warn!("Clean interrupted");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };

        tracing::info!(
            groups = groups.len(),
            duplicates = snapshot.duplicates,
            removed = snapshot.files_processed,
            errors = snapshot.errors,
            "Clean finished"
        );
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: (&snapshot).into(),
        }));

        Ok(CleanReport {
            status,
            dry_run: self.config.dry_run,
            action: self.config.action.clone(),
            groups,
            stats: snapshot,
        })
    }

    fn prepare(&self) -> Result<(), CleanError> {
        if !self.config.root.is_dir() {
            return Err(CleanError::RootNotFound {
                path: self.config.root.clone(),
            });
        }
        if let (CleanAction::Trash(dir), false) = (&self.config.action, self.config.dry_run) {
            fs::create_dir_all(dir).map_err(|source| CleanError::TrashUnavailable {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Walk the root, leaving out anything already in the trash
    fn collect(
        &self,
        token: &CancellationToken,
        stats: &Statistics,
        events: &EventSender,
    ) -> Vec<MediaFile> {
        let filter = MediaFilter::new()
            .with_extensions(&self.config.extensions)
            .with_min_size(self.config.min_size)
            .with_hidden(self.config.include_hidden);
        let scanner = WalkDirScanner::new(ScanConfig {
            filter,
            ..Default::default()
        });

        let scanned = match scanner.scan(&self.config.root, token, events) {
            Ok(scanned) => scanned,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot walk root");
                stats.record_error();
                return Vec::new();
            }
        };
        for _ in &scanned.errors {
            stats.record_error();
        }

        let trash = match &self.config.action {
            CleanAction::Trash(dir) => fs::canonicalize(dir).ok(),
            _ => None,
        };
        scanned
            .files
            .into_iter()
            .filter(|file| !trash.as_ref().is_some_and(|t| in_dir(&file.path, t)))
            .inspect(|_| stats.record_scanned())
            .collect()
    }

    /// Size, then full digest. Only same-size files are ever hashed.
    fn group(
        &self,
        files: Vec<MediaFile>,
        token: &CancellationToken,
        stats: &Statistics,
        events: &EventSender,
    ) -> Vec<DuplicateSet> {
        let mut by_size: HashMap<u64, Vec<MediaFile>> = HashMap::new();
        for file in files {
            by_size.entry(file.size).or_default().push(file);
        }
        let candidates: Vec<MediaFile> = by_size
            .into_values()
            .filter(|group| group.len() >= 2)
            .flatten()
            .collect();

        events.send(Event::Clean(CleanEvent::Hashing {
            candidates: candidates.len(),
        }));

        let hashed: Vec<(MediaFile, io::Result<String>)> = candidates
            .into_par_iter()
            .filter(|_| !token.is_cancelled())
            .map(|file| {
                let digest = full_hash(&file.path);
                (file, digest)
            })
            .collect();

        let mut by_digest: HashMap<(u64, String), Vec<MediaFile>> = HashMap::new();
        for (file, digest) in hashed {
            match digest {
                Ok(digest) => by_digest.entry((file.size, digest)).or_default().push(file),
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "Cannot hash file");
                    stats.record_error();
                    events.send(Event::Clean(CleanEvent::Failed {
                        path: file.path,
                        message: e.to_string(),
                    }));
                }
            }
        }

        let mut groups: Vec<DuplicateSet> = by_digest
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .filter_map(|((size, digest), members)| {
                split_keeper(members, self.config.keep).map(|(keeper, duplicates)| DuplicateSet {
                    keeper,
                    duplicates,
                    size,
                    digest,
                })
            })
            .collect();
        groups.sort_by(|a, b| a.keeper.cmp(&b.keeper));
        groups
    }

    fn act(&self, path: &Path, size: u64, stats: &Statistics, events: &EventSender) {
        let action = &self.config.action;
        if *action == CleanAction::Report {
            return;
        }
        if self.config.dry_run {
            tracing::debug!(path = %path.display(), action = action.label(), "Would remove");
            events.send(Event::Clean(CleanEvent::Removed {
                path: path.to_path_buf(),
                action: action.label().to_string(),
                dry_run: true,
            }));
            return;
        }

        let result = match action {
            CleanAction::Trash(dir) => move_to_trash(path, dir).map(|_| ()),
            CleanAction::Delete => fs::remove_file(path),
            CleanAction::Report => Ok(()),
        };

        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), action = action.label(), "Removed duplicate");
                stats.record_processed(size);
                events.send(Event::Clean(CleanEvent::Removed {
                    path: path.to_path_buf(),
                    action: action.label().to_string(),
                    dry_run: false,
                }));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove duplicate");
                stats.record_error();
                events.send(Event::Clean(CleanEvent::Failed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }));
            }
        }
    }
}

/// Pick the keeper by policy; the rest come back sorted by path
fn split_keeper(mut members: Vec<MediaFile>, keep: KeepPolicy) -> Option<(PathBuf, Vec<PathBuf>)> {
    members.sort_by(|a, b| a.path.cmp(&b.path));
    let index = match keep {
        KeepPolicy::Oldest => members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.modified.cmp(&b.modified))
            .map(|(i, _)| i),
        KeepPolicy::Newest => members
            .iter()
            .enumerate()
            // Ties go to the lexicographically first path
            .max_by(|(_, a), (_, b)| a.modified.cmp(&b.modified).then(b.path.cmp(&a.path)))
            .map(|(i, _)| i),
        KeepPolicy::ShortestPath => members
            .iter()
            .enumerate()
            .min_by_key(|(_, f)| f.path.as_os_str().len())
            .map(|(i, _)| i),
    }?;

    let keeper = members.remove(index).path;
    Some((keeper, members.into_iter().map(|f| f.path).collect()))
}

fn in_dir(path: &Path, dir: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|p| p.starts_with(dir))
}

/// Move `path` into `dir`, returning where it landed. A taken name gets a
/// `.{unix_nanos}` suffix.
fn move_to_trash(path: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

    let mut target = dir.join(name);
    while fs::symlink_metadata(&target).is_ok() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut suffixed = name.to_os_string();
        suffixed.push(format!(".{nanos}"));
        target = dir.join(suffixed);
    }

    if fs::rename(path, &target).is_err() {
        // Trash on another filesystem
        fs::copy(path, &target)?;
        fs::remove_file(path)?;
    }
    Ok(target)
}
