//! Import execution: one scanner thread feeding one transfer loop.

use super::naming::NamingTemplate;
use super::resolver::ConflictResolver;
use super::transfer::Transferer;
use super::types::*;
use crate::core::cancel::CancellationToken;
use crate::core::metadata::{CaptureTimeResolver, MetadataFallback, NoFallback};
use crate::core::scanner::{error_path, MediaFilter, MediaJob, ScanConfig, WalkDirScanner};
use crate::core::stats::Statistics;
use crate::error::ImportError;
use crate::events::{
    null_sender, Event, EventSender, ImportEvent, PipelineEvent, PipelinePhase, ScanEvent,
};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// Builder for an import run
pub struct ImportPipelineBuilder {
    config: ImportConfig,
    fallback: Arc<dyn MetadataFallback>,
}

impl ImportPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: ImportConfig::default(),
            fallback: Arc::new(NoFallback),
        }
    }

    /// Start from a complete configuration
    pub fn config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = destination.into();
        self
    }

    /// Set the naming template
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = template.into();
        self
    }

    pub fn mode(mut self, mode: TransferMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn conflict(mut self, policy: ConflictPolicy) -> Self {
        self.config.conflict = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn deep_check(mut self, deep_check: bool) -> Self {
        self.config.deep_check = deep_check;
        self
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.extensions = extensions;
        self
    }

    /// Minimum file size in bytes
    pub fn min_size(mut self, bytes: u64) -> Self {
        self.config.min_size = bytes;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the external capture-time source for unsupported formats
    pub fn fallback(mut self, fallback: Arc<dyn MetadataFallback>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<ImportPipeline, ImportError> {
        let template = NamingTemplate::new(self.config.template.clone())?;
        Ok(ImportPipeline {
            conflicts: ConflictResolver::new(self.config.conflict, self.config.verify_full()),
            transferer: Transferer::new(self.config.mode),
            times: CaptureTimeResolver::new(self.fallback),
            template,
            config: self.config,
        })
    }
}

impl Default for ImportPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts a source tree into the destination by capture date
pub struct ImportPipeline {
    config: ImportConfig,
    template: NamingTemplate,
    times: CaptureTimeResolver,
    conflicts: ConflictResolver,
    transferer: Transferer,
}

impl ImportPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> ImportPipelineBuilder {
        ImportPipelineBuilder::new()
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Run to completion without events or cancellation
    pub fn run_to_end(&self) -> Result<ImportReport, ImportError> {
        self.run(&CancellationToken::new(), &null_sender())
    }

    /// Run the import.
    ///
    /// Scanning (header read, timestamp extraction, fingerprint) happens on a
    /// dedicated thread; transfers happen one at a time on the calling
    /// thread. The two are joined by a bounded queue, so scanning never runs
    /// far ahead of transfers. Cancellation stops both promptly; what was
    /// already transferred stays.
    pub fn run(
        &self,
        token: &CancellationToken,
        events: &EventSender,
    ) -> Result<ImportReport, ImportError> {
        if let Err(e) = self.prepare() {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
            return Err(e);
        }

        tracing::info!(
            source = %self.config.source.display(),
            destination = %self.config.destination.display(),
            mode = ?self.config.mode,
            conflict = ?self.config.conflict,
            dry_run = self.config.dry_run,
            "Starting import"
        );
        events.send(Event::Pipeline(PipelineEvent::Started {
            phase: PipelinePhase::Importing,
        }));

        let stats = Statistics::new();
        let (jobs_tx, jobs_rx) = bounded(self.config.queue_capacity.max(1));

        let producer = thread::scope(|scope| {
            let producer = scope.spawn(|| self.produce(jobs_tx, token, &stats, events));
            self.consume(jobs_rx, token, &stats, events);
            producer.join()
        });
        let snapshot = stats.snapshot();
        if producer.is_err() {
            let e = ImportError::ProducerPanicked { stats: snapshot };
            tracing::error!(error = %e, "Import aborted");
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
            return Err(e);
        }

        let status = if token.is_cancelled() {
            tracing::warn!("Import interrupted");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };

        tracing::info!(
            processed = snapshot.files_processed,
            duplicates = snapshot.duplicates,
            errors = snapshot.errors,
            duration_ms = snapshot.duration_ms,
            "Import finished"
        );
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: (&snapshot).into(),
        }));

        Ok(ImportReport {
            status,
            dry_run: self.config.dry_run,
            stats: snapshot,
        })
    }

    /// Check the source and, unless dry-running, create the destination
    fn prepare(&self) -> Result<(), ImportError> {
        if !self.config.source.is_dir() {
            return Err(ImportError::SourceNotFound {
                path: self.config.source.clone(),
            });
        }
        if !self.config.dry_run {
            fs::create_dir_all(&self.config.destination).map_err(|source| {
                ImportError::DestinationUnavailable {
                    path: self.config.destination.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    fn scanner(&self) -> WalkDirScanner {
        let filter = MediaFilter::new()
            .with_extensions(&self.config.extensions)
            .with_min_size(self.config.min_size)
            .with_hidden(self.config.include_hidden);
        WalkDirScanner::new(ScanConfig {
            filter,
            exclude: self.nested_destination(),
            ..Default::default()
        })
    }

    /// The destination as seen from the source walk, when it lies inside the
    /// source. Files already moved there must not be picked up again.
    fn nested_destination(&self) -> Option<PathBuf> {
        let source = fs::canonicalize(&self.config.source).ok()?;
        let destination = fs::canonicalize(&self.config.destination).ok()?;
        let relative = destination.strip_prefix(&source).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.config.source.join(relative))
    }

    /// Walk the source and queue one job per qualifying file
    fn produce(
        &self,
        jobs: Sender<MediaJob>,
        token: &CancellationToken,
        stats: &Statistics,
        events: &EventSender,
    ) {
        let scanner = self.scanner();
        let walk = match scanner.walk(&self.config.source) {
            Ok(walk) => walk,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot walk source");
                stats.record_error();
                return;
            }
        };

        events.send(Event::Scan(ScanEvent::Started {
            root: self.config.source.clone(),
        }));

        let mut queued = 0usize;
        for item in walk {
            if token.is_cancelled() {
                break;
            }

            let job = match item.and_then(|file| MediaJob::build(file, &self.times)) {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping file");
                    stats.record_error();
                    events.send(Event::Scan(ScanEvent::Error {
                        path: error_path(&e),
                        message: e.to_string(),
                    }));
                    continue;
                }
            };
            stats.record_scanned();

            // Timestamp extraction may block; re-check before queueing
            if token.is_cancelled() {
                break;
            }
            events.send(Event::Scan(ScanEvent::FileFound {
                path: job.path.clone(),
                size: job.size,
            }));

            select! {
                send(jobs, job) -> sent => {
                    if sent.is_err() {
                        // Transfer loop has stopped
                        break;
                    }
                    queued += 1;
                }
                recv(token.cancelled()) -> _ => break,
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: queued,
        }));
    }

    /// Take jobs off the queue until it closes or the run is cancelled
    fn consume(
        &self,
        jobs: Receiver<MediaJob>,
        token: &CancellationToken,
        stats: &Statistics,
        events: &EventSender,
    ) {
        loop {
            if token.is_cancelled() {
                return;
            }
            select! {
                recv(jobs) -> job => match job {
                    Ok(job) => {
                        if token.is_cancelled() {
                            return;
                        }
                        self.import_one(job, stats, events);
                    }
                    Err(_) => return,
                },
                recv(token.cancelled()) -> _ => return,
            }
        }
    }

    fn import_one(&self, job: MediaJob, stats: &Statistics, events: &EventSender) {
        let relative = self
            .template
            .render(job.captured_at, &job.path, job.fingerprint);
        let target = self.config.destination.join(relative);

        match self.conflicts.resolve(&job, target) {
            Resolution::Duplicate(existing) => self.handle_duplicate(job, existing, stats, events),
            Resolution::Skipped(existing) => {
                tracing::debug!(
                    source = %job.path.display(),
                    existing = %existing.display(),
                    "Target holds a different file, skipping"
                );
                stats.record_skipped();
                events.send(Event::Import(ImportEvent::Skipped {
                    source: job.path,
                    existing,
                }));
            }
            Resolution::InPlace(path) => {
                tracing::debug!(path = %path.display(), "Already in place");
                stats.record_skipped();
                events.send(Event::Import(ImportEvent::AlreadyInPlace { path }));
            }
            placement => self.place(job, placement, stats, events),
        }
    }

    fn handle_duplicate(
        &self,
        job: MediaJob,
        existing: PathBuf,
        stats: &Statistics,
        events: &EventSender,
    ) {
        stats.record_duplicate();

        let mut source_removed = false;
        if self.config.mode == TransferMode::Move && !self.config.dry_run {
            match fs::remove_file(&job.path) {
                Ok(()) => source_removed = true,
                Err(e) => {
                    stats.record_error();
                    tracing::warn!(
                        source = %job.path.display(),
                        error = %e,
                        "Failed to delete duplicate source"
                    );
                }
            }
        }

        tracing::debug!(
            source = %job.path.display(),
            existing = %existing.display(),
            source_removed,
            "Duplicate"
        );
        events.send(Event::Import(ImportEvent::Duplicate {
            source: job.path,
            existing,
            source_removed,
        }));
    }

    fn place(
        &self,
        job: MediaJob,
        resolution: Resolution,
        stats: &Statistics,
        events: &EventSender,
    ) {
        let renamed = resolution.is_renamed();
        let target = resolution.path().to_path_buf();

        if self.config.dry_run {
            tracing::debug!(
                source = %job.path.display(),
                target = %target.display(),
                "Would transfer"
            );
            stats.record_processed(job.size);
            events.send(Event::Import(ImportEvent::Transferred {
                source: job.path,
                target,
                renamed,
                dry_run: true,
            }));
            return;
        }

        let replace = self.config.conflict == ConflictPolicy::Overwrite;
        match self.transferer.execute(&job, &target, replace) {
            Ok(bytes) => {
                tracing::debug!(
                    source = %job.path.display(),
                    target = %target.display(),
                    mode = ?self.config.mode,
                    "Transferred"
                );
                stats.record_processed(bytes);
                events.send(Event::Import(ImportEvent::Transferred {
                    source: job.path,
                    target,
                    renamed,
                    dry_run: false,
                }));
            }
            Err(e) => {
                tracing::warn!(source = %job.path.display(), error = %e, "Transfer failed");
                stats.record_error();
                events.send(Event::Import(ImportEvent::Failed {
                    source: job.path,
                    message: e.to_string(),
                }));
            }
        }
    }
}
