//! # CLI Module
//!
//! Command-line interface for the photo organizer.
//!
//! ## Usage
//! ```bash
//! # Copy a card into a dated library
//! exisort import /Volumes/SDCARD/DCIM ~/Pictures/Library
//!
//! # Move instead, and keep both files on a name clash
//! exisort import ./inbox ~/Pictures/Library --move --conflict rename
//!
//! # See what would happen
//! exisort import ./inbox ~/Pictures/Library --dry-run -v
//!
//! # Thin out identical copies already in the library
//! exisort clean ~/Pictures/Library --action trash --trash-dir ~/.exisort-trash
//! ```

mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use exisort::core::cancel::CancellationToken;
use exisort::core::clean::{CleanAction, CleanConfig, Cleaner, KeepPolicy};
use exisort::core::import::{ConflictPolicy, ImportPipeline, RunStatus, TransferMode};
use exisort::core::metadata::{ExifTool, MetadataFallback, NoFallback};
use exisort::core::scanner::{parse_extension_list, DEFAULT_EXTENSIONS};
use exisort::core::stats::StatsSnapshot;
use exisort::events::{CleanEvent, Event, EventChannel, EventReceiver, ImportEvent, PipelineEvent};
use exisort::{ExisortError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Exisort - the safe photo organizer
#[derive(Parser, Debug)]
#[command(name = "exisort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sort media into a date-based tree
    Import(ImportArgs),
    /// Find identical files in a tree and remove all but one
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Directory to import from
    source: PathBuf,

    /// Library root to import into
    destination: PathBuf,

    /// Move files instead of copying
    #[arg(long = "move")]
    move_files: bool,

    /// Simulate operations without changes
    #[arg(long)]
    dry_run: bool,

    /// Compare full content before calling a file a duplicate
    #[arg(long = "deep")]
    deep_check: bool,

    /// What to do when a different file holds the target name
    #[arg(long, default_value = "rename")]
    conflict: Conflict,

    /// Naming template
    #[arg(long = "format", default_value = exisort::core::import::DEFAULT_TEMPLATE)]
    template: String,

    /// Do not start exiftool for formats the built-in parser cannot read
    #[arg(long)]
    no_exiftool: bool,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Directory to clean
    root: PathBuf,

    /// Which copy of each identical group to keep
    #[arg(long, default_value = "oldest")]
    keep: Keep,

    /// What to do with the other copies
    #[arg(long, default_value = "report")]
    action: Action,

    /// Trash directory, required with `--action trash`
    #[arg(long, required_if_eq("action", "trash"))]
    trash_dir: Option<PathBuf>,

    /// Report what would be removed without removing it
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Comma-separated list of extensions to process
    #[arg(long, default_value_t = DEFAULT_EXTENSIONS.join(","))]
    extensions: String,

    /// Minimum file size in KB to process
    #[arg(long, default_value = "32")]
    min_size: u64,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Conflict {
    /// Keep both, suffixing the newcomer with its fingerprint
    Rename,
    /// Leave the existing file, do not import
    Skip,
    /// Replace the existing file
    Overwrite,
}

impl From<Conflict> for ConflictPolicy {
    fn from(conflict: Conflict) -> Self {
        match conflict {
            Conflict::Rename => ConflictPolicy::Rename,
            Conflict::Skip => ConflictPolicy::Skip,
            Conflict::Overwrite => ConflictPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Keep {
    /// Earliest modification time (default)
    Oldest,
    /// Latest modification time
    Newest,
    /// Shortest path
    ShortestPath,
}

impl From<Keep> for KeepPolicy {
    fn from(keep: Keep) -> Self {
        match keep {
            Keep::Oldest => KeepPolicy::Oldest,
            Keep::Newest => KeepPolicy::Newest,
            Keep::ShortestPath => KeepPolicy::ShortestPath,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// List duplicates only
    Report,
    /// Move duplicates into the trash directory
    Trash,
    /// Delete duplicates
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => run_import(args),
        Commands::Clean(args) => run_clean(args),
    }
}

/// Cancel the token on Ctrl-C or SIGTERM
fn install_interrupt_handler() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| ExisortError::Config(format!("cannot install signal handler: {e}")))?;
    Ok(token)
}

fn run_import(args: ImportArgs) -> Result<()> {
    exisort::init_tracing(args.common.verbose);
    let term = Term::stderr();
    let output = args.common.output;

    let fallback: Arc<dyn MetadataFallback> = if args.no_exiftool {
        Arc::new(NoFallback)
    } else {
        Arc::new(ExifTool::new())
    };

    let pipeline = ImportPipeline::builder()
        .source(&args.source)
        .destination(&args.destination)
        .template(args.template)
        .mode(if args.move_files {
            TransferMode::Move
        } else {
            TransferMode::Copy
        })
        .conflict(args.conflict.into())
        .dry_run(args.dry_run)
        .deep_check(args.deep_check)
        .extensions(parse_extension_list(&args.filter.extensions))
        .min_size(args.filter.min_size * 1024)
        .include_hidden(args.filter.include_hidden)
        .fallback(fallback)
        .build()?;

    if output == OutputFormat::Pretty {
        output::print_header(&term, "Importing", &args.source, args.dry_run);
    }

    let token = install_interrupt_handler()?;
    let (sender, receiver) = EventChannel::new();
    let progress = spinner(output);
    let watcher = watch_events(receiver, progress.clone(), args.common.verbose);

    let result = pipeline.run(&token, &sender);

    drop(sender);
    watcher.join().ok();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            output::print_partial_stats(&term, output, &e.stats(), "Imported/Moved:")?;
            return Err(e.into());
        }
    };
    if report.status == RunStatus::Interrupted {
        output::warn_interrupted(&term);
    }
    match output {
        OutputFormat::Pretty => output::print_import_summary(&term, &report),
        OutputFormat::Json => output::print_json(&report)?,
    }
    Ok(())
}

fn run_clean(args: CleanArgs) -> Result<()> {
    exisort::init_tracing(args.common.verbose);
    let term = Term::stderr();
    let output = args.common.output;

    let action = match (args.action, args.trash_dir) {
        (Action::Report, _) => CleanAction::Report,
        (Action::Delete, _) => CleanAction::Delete,
        (Action::Trash, Some(dir)) => CleanAction::Trash(dir),
        (Action::Trash, None) => {
            return Err(ExisortError::Config(
                "--action trash needs --trash-dir".to_string(),
            ))
        }
    };

    let cleaner = Cleaner::new(CleanConfig {
        root: args.root.clone(),
        keep: args.keep.into(),
        action,
        dry_run: args.dry_run,
        extensions: parse_extension_list(&args.filter.extensions),
        min_size: args.filter.min_size * 1024,
        include_hidden: args.filter.include_hidden,
    });

    if output == OutputFormat::Pretty {
        output::print_header(&term, "Cleaning", &args.root, args.dry_run);
    }

    let token = install_interrupt_handler()?;
    let (sender, receiver) = EventChannel::new();
    let progress = spinner(output);
    let watcher = watch_events(receiver, progress.clone(), args.common.verbose);

    let result = cleaner.run(&token, &sender);

    drop(sender);
    watcher.join().ok();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            // Clean fails only before touching any file
            output::print_partial_stats(&term, output, &StatsSnapshot::default(), "Deleted:")?;
            return Err(e.into());
        }
    };
    if report.status == RunStatus::Interrupted {
        output::warn_interrupted(&term);
    }
    match output {
        OutputFormat::Pretty => output::print_clean_summary(&term, &report, args.common.verbose),
        OutputFormat::Json => output::print_json(&report)?,
    }
    Ok(())
}

fn spinner(output: OutputFormat) -> Option<ProgressBar> {
    if output != OutputFormat::Pretty {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {pos} files {msg}") {
        pb.set_style(spinner_style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Drive the spinner from pipeline events until the sender is dropped
fn watch_events(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = &progress else {
                continue;
            };
            match event {
                Event::Import(ImportEvent::Transferred { source, .. })
                | Event::Import(ImportEvent::Duplicate { source, .. })
                | Event::Import(ImportEvent::Skipped { source, .. })
                | Event::Import(ImportEvent::AlreadyInPlace { path: source }) => {
                    pb.inc(1);
                    if verbose {
                        pb.set_message(output::file_name(&source));
                    }
                }
                Event::Import(ImportEvent::Failed { source, message }) => {
                    pb.inc(1);
                    pb.println(format!(
                        "{} {}: {}",
                        style("✗").red(),
                        source.display(),
                        message
                    ));
                }
                Event::Clean(CleanEvent::Hashing { candidates }) => {
                    pb.set_message(format!("hashing {candidates} candidates"));
                }
                Event::Clean(CleanEvent::Removed { .. }) => pb.inc(1),
                Event::Clean(CleanEvent::Failed { path, message }) => {
                    pb.println(format!("{} {}: {}", style("✗").red(), path.display(), message));
                }
                Event::Pipeline(PipelineEvent::Cancelled) => {
                    pb.set_message("stopping...");
                }
                _ => {}
            }
        }
    })
}
