//! CLI output formatting.
//!
//! Each article leads with its identity (short reference and title), with
//! output paths and content notes as indented context lines:
//!
//! ```text
//! the-road-north (The Road North) → out/issue-2-4/the-road-north
//!     Files: web_content.html, metadata.yml
//!     Dropped: content[7] pull-quote
//! FAILED essays/broken.json
//!     content[3] (image): url-format "/x.jpg" has no `***` size placeholder in its file name
//!
//! Rendered 12 articles, 1 failed, 1 element dropped
//! ```
//!
//! Every `format_*` function returns lines for testability and has a
//! `print_*` wrapper that writes them to stdout. Format functions are pure.

use crate::process::{ArticleReport, BatchSummary, ProcessEvent};
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Per-article progress
// ============================================================================

fn format_report(report: &ArticleReport) -> Vec<String> {
    let identity = format!("{} ({})", report.short_reference, report.title);
    let mut lines = vec![match &report.output_dir {
        Some(dir) => format!("{} \u{2192} {}", identity, dir.display()),
        None if report.files.is_empty() => format!("{identity}: nothing to write"),
        None => format!("{identity}: ok"),
    }];
    if !report.files.is_empty() {
        lines.push(format!("{}Files: {}", indent(1), report.files.join(", ")));
    }
    for dropped in &report.dropped {
        lines.push(format!(
            "{}Dropped: content[{}] {}",
            indent(1),
            dropped.index,
            dropped.tag
        ));
    }
    lines
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Rendered(report) => format_report(report),
        ProcessEvent::Failed { source, error } => vec![
            format!("FAILED {}", source.display()),
            format!("{}{}", indent(1), error),
        ],
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Format the closing totals of a batch written under `output_root`.
pub fn format_summary(summary: &BatchSummary, output_root: &Path) -> Vec<String> {
    let mut lines = vec![String::new()];
    let mut totals = format!("Rendered {}", plural(summary.rendered.len(), "article"));
    if !summary.failed.is_empty() {
        totals.push_str(&format!(", {} failed", summary.failed.len()));
    }
    let dropped = summary.dropped_count();
    if dropped > 0 {
        totals.push_str(&format!(", {} dropped", plural(dropped, "element")));
    }
    lines.push(totals);

    let written = summary
        .rendered
        .iter()
        .filter(|r| r.output_dir.is_some())
        .count();
    if written > 0 {
        lines.push(format!(
            "{}Output: {} written under {}",
            indent(1),
            plural(written, "article"),
            output_root.display()
        ));
    }
    lines
}

pub fn print_summary(summary: &BatchSummary, output_root: &Path) {
    for line in format_summary(summary, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Image listing
// ============================================================================

/// One URL per line, the format the CDN sync script reads.
pub fn format_image_urls(urls: &[String]) -> Vec<String> {
    urls.to_vec()
}

pub fn print_image_urls(urls: &[String]) {
    for line in format_image_urls(urls) {
        println!("{}", line);
    }
}
