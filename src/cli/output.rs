//! Terminal and JSON rendering of run reports.

use super::OutputFormat;
use console::{style, Term};
use exisort::core::clean::{CleanAction, CleanReport};
use exisort::core::import::ImportReport;
use exisort::core::stats::StatsSnapshot;
use exisort::{ExisortError, Result};
use serde::Serialize;
use std::path::Path;

const RULE: &str = "----------------------------------------";

pub fn print_header(term: &Term, verb: &str, root: &Path, dry_run: bool) {
    term.write_line(&format!(
        "{} {} {}",
        style("exisort").bold().cyan(),
        style(verb).bold(),
        root.display()
    ))
    .ok();
    if dry_run {
        term.write_line(&format!(
            "{}",
            style("Dry run: nothing will be changed").yellow()
        ))
        .ok();
    }
}

pub fn warn_interrupted(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("!").yellow().bold(),
        style("Interrupted by user").yellow()
    ))
    .ok();
}

pub fn print_import_summary(term: &Term, report: &ImportReport) {
    let processed_label = if report.dry_run {
        "Would import:"
    } else {
        "Imported/Moved:"
    };
    print_stats(term, &report.stats, processed_label);
}

pub fn print_clean_summary(term: &Term, report: &CleanReport, verbose: bool) {
    if !report.groups.is_empty() && (verbose || report.action == CleanAction::Report) {
        term.write_line("").ok();
        for (i, group) in report.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} copies, {} each",
                style(format!("Group {}:", i + 1)).bold(),
                group.duplicates.len() + 1,
                format_bytes(group.size)
            ))
            .ok();
            term.write_line(&format!("    {} {}", style("★").green(), group.keeper.display()))
                .ok();
            for duplicate in &group.duplicates {
                term.write_line(&format!("    {} {}", style("○").dim(), duplicate.display()))
                    .ok();
            }
        }
        term.write_line("").ok();
    }

    let processed_label = match report.action {
        CleanAction::Trash(_) => "Trashed:",
        _ => "Deleted:",
    };
    print_stats(term, &report.stats, processed_label);
    if report.stats.files_processed == 0 && !report.groups.is_empty() {
        term.write_line(&format!(
            "{} {}",
            style("Reclaimable:").dim(),
            style(format_bytes(report.reclaimable())).yellow()
        ))
        .ok();
    }
}

/// Counters gathered before a fatal error, shown ahead of the error itself
pub fn print_partial_stats(
    term: &Term,
    output: OutputFormat,
    stats: &StatsSnapshot,
    processed_label: &str,
) -> Result<()> {
    match output {
        OutputFormat::Pretty => print_stats(term, stats, processed_label),
        OutputFormat::Json => print_json(stats)?,
    }
    Ok(())
}

/// The end-of-run table: zero rows are left out, except scanned and duration
fn print_stats(term: &Term, stats: &StatsSnapshot, processed_label: &str) {
    let mut rows: Vec<(&str, String)> = vec![("Total Scanned:", stats.files_scanned.to_string())];
    if stats.files_processed > 0 {
        rows.push((processed_label, stats.files_processed.to_string()));
        rows.push(("Data Volume:", format_bytes(stats.bytes_moved)));
    }
    if stats.duplicates > 0 {
        rows.push(("Duplicates:", stats.duplicates.to_string()));
    }
    if stats.skipped > 0 {
        rows.push(("Skipped:", stats.skipped.to_string()));
    }
    if stats.errors > 0 {
        rows.push(("Errors:", style(stats.errors).red().to_string()));
    }
    rows.push(("Duration:", format!("{}ms", stats.duration_ms)));

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
    term.write_line(RULE).ok();
    for (label, value) in rows {
        term.write_line(&format!("{label:<width$}{value}")).ok();
    }
    term.write_line(RULE).ok();
}

pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| ExisortError::Config(format!("cannot encode report: {e}")))?;
    println!("{json}");
    Ok(())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Binary units with one decimal: `512 B`, `1.5 KB`, `3.2 GB`
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}
