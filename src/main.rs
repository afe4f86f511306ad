//! # exisort CLI
//!
//! Command-line interface for the photo organizer.
//!
//! ## Usage
//! ```bash
//! exisort import /Volumes/SDCARD/DCIM ~/Pictures/Library --move
//! exisort clean ~/Pictures/Library --action trash --trash-dir ~/.Trash/exisort
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("Failed:").red().bold());
            ExitCode::FAILURE
        }
    }
}
