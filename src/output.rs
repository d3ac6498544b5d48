//! CLI output formatting.
//!
//! Progress goes to stdout; diagnostics go to stderr through `tracing`.
//! The two never mix, so `pagesmith generate ... > log.txt` captures a clean
//! progress transcript.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Writing article: AI Trends
//! 人工智能的未来 (3 sections, 3 image prompts)
//! 001/003 a robot reading a book
//!     obtained
//!     waiting 5s
//! 002/003 a neural network glowing in the dark
//!     absent
//! ...
//! Finished with 2 images
//! ```
//!
//! ## Package
//!
//! ```text
//! ai-trends.zip → dist/ai-trends.zip
//!     .gitignore
//!     LICENSE
//!     README.md
//!     ai-trends-1.png (48213 bytes)
//!     index.html
//!     robots.txt
//!     sitemap.xml
//! Packaged 7 files
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::bundle::{Bundle, Entry};
use crate::pipeline::RunEvent;
use std::path::Path;

/// Longest image prompt shown on a progress line.
const PROMPT_DISPLAY_CHARS: usize = 60;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
///
/// Counts characters, not bytes: prompts and titles may be Chinese.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

// ============================================================================
// Generate progress
// ============================================================================

/// Format a single run progress event as display lines.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::ContentStarted { topic } => vec![format!("Writing article: {topic}")],
        RunEvent::ContentReady {
            title,
            sections,
            prompts,
        } => vec![format!(
            "{title} ({sections} sections, {prompts} image prompts)"
        )],
        RunEvent::Waiting { delay } => {
            vec![format!("{}waiting {}s", indent(1), delay.as_secs_f64())]
        }
        RunEvent::ImageStarted {
            index,
            total,
            prompt,
        } => vec![format!(
            "{}/{} {}",
            format_index(*index),
            format_index(*total),
            truncate(prompt, PROMPT_DISPLAY_CHARS)
        )],
        RunEvent::ImageFinished { obtained, .. } => {
            let status = if *obtained { "obtained" } else { "absent" };
            vec![format!("{}{status}", indent(1))]
        }
        RunEvent::Finished { images } => match images {
            1 => vec!["Finished with 1 image".to_string()],
            n => vec![format!("Finished with {n} images")],
        },
        RunEvent::Failed { message } => vec![format!("Failed: {message}")],
    }
}

pub fn print_run_event(event: &RunEvent) {
    for line in format_run_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Package output
// ============================================================================

/// Format the archive written for a bundle.
///
/// Text entries show their path; binary entries add their size.
pub fn format_bundle_output(bundle: &Bundle, archive_path: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{} \u{2192} {}",
        bundle.archive_name(),
        archive_path.display()
    )];

    for path in bundle.paths() {
        match bundle.get(path) {
            Some(Entry::Binary(bytes)) => {
                lines.push(format!("{}{path} ({} bytes)", indent(1), bytes.len()))
            }
            _ => lines.push(format!("{}{path}", indent(1))),
        }
    }

    lines.push(format!("Packaged {} files", bundle.len()));
    lines
}

pub fn print_bundle_output(bundle: &Bundle, archive_path: &Path) {
    for line in format_bundle_output(bundle, archive_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::assemble;
    use crate::config::SiteConfig;
    use crate::test_helpers::{sample_data, sample_images};
    use std::time::Duration;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn truncate_short() {
        assert_eq!(truncate("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_exact() {
        let text = "a".repeat(40);
        assert_eq!(truncate(&text, 40), text);
    }

    #[test]
    fn truncate_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("人工智能的未来", 4), "人工智能...");
    }

    // =========================================================================
    // Run events
    // =========================================================================

    #[test]
    fn content_events() {
        assert_eq!(
            format_run_event(&RunEvent::ContentStarted {
                topic: "AI Trends".to_string()
            }),
            vec!["Writing article: AI Trends"]
        );
        assert_eq!(
            format_run_event(&RunEvent::ContentReady {
                title: "人工智能的未来".to_string(),
                sections: 3,
                prompts: 3,
            }),
            vec!["人工智能的未来 (3 sections, 3 image prompts)"]
        );
    }

    #[test]
    fn image_events() {
        assert_eq!(
            format_run_event(&RunEvent::ImageStarted {
                index: 2,
                total: 3,
                prompt: "a robot".to_string(),
            }),
            vec!["002/003 a robot"]
        );
        assert_eq!(
            format_run_event(&RunEvent::ImageFinished {
                index: 2,
                total: 3,
                obtained: false,
            }),
            vec!["    absent"]
        );
        assert_eq!(
            format_run_event(&RunEvent::Waiting {
                delay: Duration::from_secs(5)
            }),
            vec!["    waiting 5s"]
        );
    }

    #[test]
    fn long_prompt_is_truncated() {
        let lines = format_run_event(&RunEvent::ImageStarted {
            index: 1,
            total: 1,
            prompt: "x".repeat(100),
        });
        assert!(lines[0].ends_with("..."));
        assert_eq!(lines[0].chars().count(), "001/001 ".len() + PROMPT_DISPLAY_CHARS + 3);
    }

    #[test]
    fn finish_and_failure() {
        assert_eq!(
            format_run_event(&RunEvent::Finished { images: 1 }),
            vec!["Finished with 1 image"]
        );
        assert_eq!(
            format_run_event(&RunEvent::Finished { images: 0 }),
            vec!["Finished with 0 images"]
        );
        assert_eq!(
            format_run_event(&RunEvent::Failed {
                message: "quota exceeded".to_string()
            }),
            vec!["Failed: quota exceeded"]
        );
    }

    // =========================================================================
    // Bundle output
    // =========================================================================

    #[test]
    fn bundle_output_lists_entries() {
        let bundle = assemble(
            "AI Trends",
            "https://example.com/x",
            &sample_data(),
            &sample_images(1),
            &SiteConfig::default(),
            2025,
        );
        let lines = format_bundle_output(&bundle, Path::new("dist/ai-trends.zip"));

        assert_eq!(lines[0], "ai-trends.zip \u{2192} dist/ai-trends.zip");
        assert!(lines.contains(&"    index.html".to_string()));
        assert!(lines.contains(&"    ai-trends-1.png (5 bytes)".to_string()));
        assert_eq!(lines.last().unwrap(), "Packaged 7 files");
        assert_eq!(lines.len(), 7 + 2);
    }
}
