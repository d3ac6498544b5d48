//! File naming for the generated bundle.
//!
//! Every file name in the archive derives from one slug computed from the
//! user's topic:
//!
//! - `"AI Trends"` → `ai-trends` → `ai-trends-1.png`, `ai-trends.zip`
//! - `"2025年人工智能发展趋势"` → `2025年人工智能发展趋势`
//! - `"!!!"` → `image` (fallback)
//!
//! Lowercase ASCII letters, digits and CJK Unified Ideographs
//! (`U+4E00..=U+9FA5`) are kept. Any run of other characters collapses into a
//! single `-`, and leading/trailing dashes are trimmed.

use regex::Regex;
use std::sync::LazyLock;

/// Slug used when nothing filesystem-safe survives from the topic.
pub const FALLBACK_SLUG: &str = "image";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\x{4e00}-\x{9fa5}]+").expect("valid slug regex"));

/// Derive a filesystem- and URL-safe slug from a topic.
pub fn slugify(topic: &str) -> String {
    let lowered = topic.to_lowercase();
    let dashed = UNSAFE_RUN.replace_all(&lowered, "-");
    let slug = dashed.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Archive entry name for the image at a 1-based position.
pub fn image_filename(slug: &str, position: usize) -> String {
    format!("{slug}-{position}.png")
}

/// Download name for the whole bundle.
pub fn archive_filename(slug: &str) -> String {
    format!("{slug}.zip")
}

/// Saved-run name written next to the archive when packaging fails.
pub fn run_filename(slug: &str) -> String {
    format!("{slug}.run.json")
}
