//! Core CLI commands for bundlegroups: scan, init, check.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bundlegroups::config::Config;
use bundlegroups::discover::{self, ScannedFile};
use bundlegroups::error::Error;
use bundlegroups::hasher;
use bundlegroups::manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
use bundlegroups::types::{Fingerprint, GroupLimit, Reference};
use serde::Serialize;

/// How scan results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Machine-readable JSON array.
    Json,
    /// One block per file, one line per reference.
    #[default]
    Text,
}

/// JSON shape of one scanned file.
#[derive(Serialize)]
struct FileReport<'a> {
    /// Path relative to the project root.
    file: &'a Path,
    /// Groups in document order.
    groups: Vec<GroupReport<'a>>,
}

/// JSON shape of one group.
#[derive(Serialize)]
struct GroupReport<'a> {
    /// Bundle identity of the group.
    fingerprint: Fingerprint,
    /// The group's references.
    references: &'a [Reference],
}

/// Outcome of comparing one manifest entry with the current scan.
enum CheckResult {
    /// The group's URLs changed, or it appeared or disappeared.
    Changed,
    /// Fingerprint matches.
    Current,
    /// The source file no longer exists or is no longer scanned.
    Missing,
}

/// Re-scan every markup file and compare against the manifest.
///
/// # Errors
///
/// Returns errors from config loading, manifest reading, or scanning.
pub fn check(limit: Option<GroupLimit>) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let manifest = Manifest::read(&root.join(MANIFEST_FILE))?;
    let options = config.scan_options(limit);

    let scans = discover::scan_all(&root, &config, &options)?;
    let scanned: HashSet<&Path> = scans.iter().map(|scan| return scan.path.as_path()).collect();
    let current = Manifest::from_scans(&scans);

    let mut changed_count = 0_u32;
    let mut missing_count = 0_u32;

    for entry in &manifest.entries {
        match compare_entry(entry, &scanned, &current) {
            CheckResult::Changed => {
                changed_count = changed_count.saturating_add(1);
                println!("CHANGED {} #{}", entry.source.display(), entry.index);
            },
            CheckResult::Current => {},
            CheckResult::Missing => {
                missing_count = missing_count.saturating_add(1);
                println!("MISSING {} #{}", entry.source.display(), entry.index);
            },
        }
    }

    for entry in &current.entries {
        if manifest.get(&entry.source, entry.index).is_none() {
            changed_count = changed_count.saturating_add(1);
            println!("NEW     {} #{}", entry.source.display(), entry.index);
        }
    }

    // Exit code priority: missing (2) > changed (1) > current (0).
    if missing_count > 0 {
        println!();
        println!("{missing_count} missing, {changed_count} changed");
        return Ok(ExitCode::from(2));
    } else if changed_count > 0 {
        println!();
        println!("{changed_count} changed");
        eprintln!("hint: run `bundlegroups init` to accept the new grouping");
        return Ok(ExitCode::from(1));
    } else {
        let total = manifest.entries.len();
        println!("All {total} groups current");
        return Ok(ExitCode::SUCCESS);
    }
}

/// Compare one recorded entry with the current scan of the tree.
fn compare_entry(entry: &ManifestEntry, scanned: &HashSet<&Path>, current: &Manifest) -> CheckResult {
    if !scanned.contains(entry.source.as_path()) {
        return CheckResult::Missing;
    }
    return match current.get(&entry.source, entry.index) {
        Some(now) if now.fingerprint == entry.fingerprint => CheckResult::Current,
        _ => CheckResult::Changed,
    };
}

/// Scan every markup file and write the manifest.
///
/// # Errors
///
/// Returns errors from config loading, scanning, or manifest writing.
pub fn init(limit: Option<GroupLimit>) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let options = config.scan_options(limit);

    let scans = discover::scan_all(&root, &config, &options)?;
    let manifest = Manifest::from_scans(&scans);
    manifest.write(&root.join(MANIFEST_FILE))?;

    let count = manifest.entries.len();
    let files = scans.len();
    eprintln!("Wrote {count} groups from {files} files to {MANIFEST_FILE}");
    return Ok(());
}

/// Print scan results as JSON.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn print_json(scans: &[ScannedFile]) -> Result<(), Error> {
    let reports: Vec<FileReport<'_>> = scans
        .iter()
        .map(|scan| {
            return FileReport {
                file: &scan.path,
                groups: scan
                    .groups
                    .iter()
                    .map(|group| {
                        return GroupReport {
                            fingerprint: hasher::fingerprint(group),
                            references: group,
                        };
                    })
                    .collect(),
            };
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    return Ok(());
}

/// Print scan results as indented text.
fn print_text(scans: &[ScannedFile]) {
    for scan in scans {
        println!("{}", scan.path.display());
        if scan.groups.is_empty() {
            println!("  (no references)");
        }
        for (index, group) in scan.groups.iter().enumerate() {
            let fingerprint = hasher::fingerprint(group);
            let short = fingerprint.0.get(..12).unwrap_or(&fingerprint.0);
            let noun = if group.len() == 1 { "reference" } else { "references" };
            println!("  group {index}: {} {noun} [{short}]", group.len());
            for reference in group {
                println!(
                    "    {}..{}  {:<10}  {}",
                    reference.start, reference.end, reference.kind, reference.url
                );
            }
        }
    }
    return;
}

/// Scan the given files, or every discovered markup file, and print the groups.
///
/// # Errors
///
/// Returns errors from config loading, scanning, or JSON output.
pub fn scan(paths: &[PathBuf], limit: Option<GroupLimit>, format: OutputFormat) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let options = config.scan_options(limit);

    let scans = if paths.is_empty() {
        discover::scan_all(&root, &config, &options)?
    } else {
        paths
            .iter()
            .map(|path| return discover::scan_file(&root, path, &options))
            .collect::<Result<Vec<_>, _>>()?
    };

    return match format {
        OutputFormat::Json => print_json(&scans),
        OutputFormat::Text => {
            print_text(&scans);
            Ok(())
        },
    };
}
