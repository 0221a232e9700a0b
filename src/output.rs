//! CLI output formatting for the pipeline.
//!
//! # Output Format
//!
//! ## Assemble (streamed while releases are processed)
//!
//! ```text
//! Skipping README.txt
//! Found version 9.3.0.b2174.g1a2b3c4 (Wed, 3 Feb 2016 10:00:00 +0000) with 4 files and 12 commits
//! ```
//!
//! ## Model summary
//!
//! ```text
//! Builds
//! 001 9.3.0.b2174.g1a2b3c4 (Wed, 3 Feb 2016 10:00:00 +0000)
//!     patcher: 2 files
//!     utilities: 1 file
//!     12 commits
//! 002 9.2.0.b2100.g0f9e8d7 (Mon, 1 Feb 2016 10:00:00 +0000)
//!     patcher: 2 files
//!     oldest build
//! ```
//!
//! ## Generate
//!
//! ```text
//! Generated index.html
//! Generated downloads/index.html
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability and has a
//! `print_*` wrapper that writes to stdout. Format functions are pure — no
//! I/O, no side effects.

use crate::assemble::AssembleEvent;
use crate::types::Build;
use std::collections::BTreeMap;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// Assemble output
// ============================================================================

/// Format a single assembly progress event.
pub fn format_assemble_event(event: &AssembleEvent) -> Vec<String> {
    match event {
        AssembleEvent::ReleaseSkipped { name } => vec![format!("Skipping {}", name)],
        AssembleEvent::BuildAssembled {
            version,
            timestamp,
            file_count,
            commit_count,
        } => vec![format!(
            "Found version {} ({}) with {} files and {} commits",
            version, timestamp, file_count, commit_count
        )],
    }
}

/// Format the assembled model: one entry per build with per-variant file
/// counts and the changelog size.
pub fn format_builds_output(builds: &[Build]) -> Vec<String> {
    let mut lines = vec!["Builds".to_string()];
    if builds.is_empty() {
        lines.push("    (none published)".to_string());
        return lines;
    }

    for (i, build) in builds.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            build.version,
            build.timestamp
        ));

        let mut variants: BTreeMap<&str, usize> = BTreeMap::new();
        for file in &build.files {
            *variants.entry(file.variant.as_str()).or_insert(0) += 1;
        }
        for (name, count) in variants {
            lines.push(format!("    {}: {}", name, plural(count, "file", "files")));
        }

        if build.commits.is_empty() {
            lines.push("    oldest build".to_string());
        } else {
            lines.push(format!(
                "    {}",
                plural(build.commits.len(), "commit", "commits")
            ));
        }
    }
    lines
}

/// Print the assembled model to stdout.
pub fn print_builds_output(builds: &[Build]) {
    for line in format_builds_output(builds) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format the list of pages written by the generate stage.
pub fn format_generate_output(written: &[String]) -> Vec<String> {
    written
        .iter()
        .map(|page| format!("Generated {}", page))
        .collect()
}

/// Print generate stage output to stdout.
pub fn print_generate_output(written: &[String]) {
    for line in format_generate_output(written) {
        println!("{}", line);
    }
}
