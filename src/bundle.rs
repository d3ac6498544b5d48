//! Static-site bundle assembly.
//!
//! Turns a finished run into the files of a one-page site and packs them
//! into a zip archive named after the topic slug.
//!
//! ## Bundle Contents
//!
//! ```text
//! ai-trends.zip
//! ├── index.html        # Redirects immediately; full article for crawlers
//! ├── README.md         # Markdown mirror of the article
//! ├── LICENSE           # MIT, current year
//! ├── .gitignore
//! ├── robots.txt        # Allow everything
//! ├── sitemap.xml       # Single URL: the redirect target
//! ├── ai-trends-1.png   # One per image actually obtained
//! └── ai-trends-2.png
//! ```
//!
//! Assembly is a pure function of its inputs plus the license year, so the
//! same run always produces byte-identical `index.html` and `README.md`.
//! Images are numbered over the images present: with two images there are
//! exactly `-1` and `-2`, whichever prompt failed.
//!
//! ## HTML Generation
//!
//! `index.html` is rendered with maud. Everything interpolated into it
//! (topic, model-written text, the redirect URL) is escaped; the article
//! text comes from a remote model and is treated as untrusted.

use crate::config::SiteConfig;
use crate::naming::{archive_filename, image_filename, run_filename, slugify};
use crate::pipeline::Run;
use crate::types::{GeneratedData, Image};
use chrono::Datelike;
use maud::{DOCTYPE, Markup, html};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Longest `<meta name="description">` search engines display.
pub const META_DESCRIPTION_LIMIT: usize = 160;

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const GITIGNORE: &str = "node_modules/\ndist/\n.DS_Store";

const ROBOTS_TXT: &str = "User-agent: *\nAllow: /\nSitemap: sitemap.xml";

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("run has no generated content to package")]
    NoContent,
}

/// Packaging failed; the run was kept on disk if `saved_run` is set.
#[derive(Error, Debug)]
#[error("packaging failed: {source}")]
pub struct PackageError {
    pub source: BundleError,
    pub saved_run: Option<PathBuf>,
}

/// Result of [`package_run`].
#[derive(Debug)]
pub struct Packaged {
    pub bundle: Bundle,
    pub archive: PathBuf,
    /// Where the run was saved, if it was.
    pub saved_run: Option<PathBuf>,
}

/// Contents of one bundle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Text(String),
    Binary(Vec<u8>),
}

impl Entry {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Entry::Text(text) => text.as_bytes(),
            Entry::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Entry::Text(text) => Some(text),
            Entry::Binary(_) => None,
        }
    }
}

/// The assembled site: relative path → file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    slug: String,
    entries: BTreeMap<String, Entry>,
}

impl Bundle {
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Download name, `<slug>.zip`.
    pub fn archive_name(&self) -> String {
        archive_filename(&self.slug)
    }

    /// Entry paths in archive order.
    pub fn paths(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Entry::as_text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every entry into one deflated zip archive.
    pub fn to_zip(&self) -> Result<Vec<u8>, BundleError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, entry) in &self.entries {
            writer.start_file(path.as_str(), file_options())?;
            writer.write_all(entry.as_bytes())?;
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Write `<slug>.zip` into `output_dir` and return its path.
    ///
    /// The archive is fully serialized in memory, written to a `.part` file
    /// and renamed into place, so a failure never leaves a truncated archive
    /// under the final name.
    pub fn write_zip(&self, output_dir: &Path) -> Result<PathBuf, BundleError> {
        let bytes = self.to_zip()?;
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(self.archive_name());
        let partial = output_dir.join(format!("{}.part", self.archive_name()));
        fs::write(&partial, &bytes)?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        info!(path = %path.display(), bytes = bytes.len(), "archive written");
        Ok(path)
    }
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Year stamped into the bundled license.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Everything the page renderers read.
struct PageContext<'a> {
    topic: &'a str,
    redirect_url: &'a str,
    data: &'a GeneratedData,
    image_files: &'a [String],
    site: &'a SiteConfig,
}

/// Assemble the bundle for a topic, content record and image sequence.
pub fn assemble(
    topic: &str,
    redirect_url: &str,
    data: &GeneratedData,
    images: &[Image],
    site: &SiteConfig,
    year: i32,
) -> Bundle {
    let topic = topic.trim();
    let redirect_url = redirect_url.trim();
    let slug = slugify(topic);
    let mut entries = BTreeMap::new();

    let mut image_files = Vec::with_capacity(images.len());
    for img in images {
        let Some(png) = png_bytes(img) else {
            continue;
        };
        let name = image_filename(&slug, image_files.len() + 1);
        entries.insert(name.clone(), Entry::Binary(png));
        image_files.push(name);
    }

    let ctx = PageContext {
        topic,
        redirect_url,
        data,
        image_files: &image_files,
        site,
    };
    entries.insert(
        "index.html".to_string(),
        Entry::Text(render_index(&ctx).into_string()),
    );
    entries.insert("README.md".to_string(), Entry::Text(render_readme(&ctx)));
    entries.insert(
        "LICENSE".to_string(),
        Entry::Text(license_text(year, &site.copyright_holder)),
    );
    entries.insert(".gitignore".to_string(), Entry::Text(GITIGNORE.to_string()));
    entries.insert("robots.txt".to_string(), Entry::Text(ROBOTS_TXT.to_string()));
    entries.insert(
        "sitemap.xml".to_string(),
        Entry::Text(render_sitemap(redirect_url)),
    );

    debug!(slug = %slug, entries = entries.len(), "bundle assembled");
    Bundle { slug, entries }
}

/// Assemble the bundle for a saved or just-finished run.
pub fn assemble_run(run: &Run, site: &SiteConfig, year: i32) -> Result<Bundle, BundleError> {
    let data = run.data.as_ref().ok_or(BundleError::NoContent)?;
    Ok(assemble(
        &run.topic,
        &run.redirect_url,
        data,
        &run.images,
        site,
        year,
    ))
}

/// Save the run (when asked), then write its archive into `output_dir`.
///
/// A failed save is logged and never stops packaging. If packaging fails
/// and the run is not on disk yet, it is saved as `<output_dir>/<slug>.run.json`
/// so the archive can be rebuilt later without regenerating.
pub fn package_run(
    run: &Run,
    site: &SiteConfig,
    output_dir: &Path,
    save_to: Option<&Path>,
    year: i32,
) -> Result<Packaged, PackageError> {
    let mut saved_run = save_to.and_then(|path| save_logged(run, path));

    let written = assemble_run(run, site, year)
        .and_then(|bundle| bundle.write_zip(output_dir).map(|archive| (bundle, archive)));

    match written {
        Ok((bundle, archive)) => Ok(Packaged {
            bundle,
            archive,
            saved_run,
        }),
        Err(source) => {
            if saved_run.is_none() {
                let fallback = output_dir.join(run_filename(&slugify(&run.topic)));
                saved_run = save_logged(run, &fallback);
            }
            Err(PackageError { source, saved_run })
        }
    }
}

fn save_logged(run: &Run, path: &Path) -> Option<PathBuf> {
    match run.save(path) {
        Ok(()) => {
            info!(path = %path.display(), "run saved");
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not save run");
            None
        }
    }
}

/// Image bytes as PNG, or `None` for a payload that is not an image.
///
/// Images from a live run are already PNG. Run files edited by hand or
/// written by older versions may still carry other formats; an unreadable
/// one is left out rather than failing the whole bundle.
fn png_bytes(img: &Image) -> Option<Vec<u8>> {
    match img.clone().into_png() {
        Ok(png) => Some(png.data),
        Err(e) => {
            warn!(mime_type = %img.mime_type, error = %e, "leaving undecodable image out of the bundle");
            None
        }
    }
}

/// First [`META_DESCRIPTION_LIMIT`] characters of the introduction.
fn meta_description(introduction: &str) -> String {
    introduction.chars().take(META_DESCRIPTION_LIMIT).collect()
}

fn meta_keywords(topic: &str, extra: &[String]) -> String {
    std::iter::once(topic)
        .chain(extra.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// index.html
// ============================================================================

fn render_index(ctx: &PageContext) -> Markup {
    let url = ctx.redirect_url;
    let refresh = format!("0; url={url}");

    html! {
        (DOCTYPE)
        html lang=(ctx.site.language) {
            head {
                meta charset="UTF-8";
                meta http-equiv="refresh" content=(refresh);
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (ctx.topic) }
                meta name="description" content=(meta_description(&ctx.data.introduction));
                meta name="keywords" content=(meta_keywords(ctx.topic, &ctx.site.keywords));
                meta name="robots" content="index, follow";
                script src=(TAILWIND_CDN) {}
            }
            body class="bg-gray-50 text-gray-900 font-sans antialiased" {
                noscript {
                    div class="fixed inset-0 flex items-center justify-center bg-white z-50" {
                        div class="text-center p-6 max-w-md" {
                            h2 class="text-xl font-bold text-red-600 mb-2" { "需要跳转" }
                            p class="text-gray-600 mb-4" { "如果页面没有自动跳转，请点击下方按钮。" }
                            a href=(url) class="inline-block bg-blue-600 text-white px-6 py-2 rounded-lg font-medium hover:bg-blue-700 transition" {
                                "点击跳转"
                            }
                        }
                    }
                }
                article class="max-w-3xl mx-auto px-4 py-12 md:py-16" {
                    header class="text-center mb-12" {
                        h1 class="text-3xl md:text-5xl font-extrabold text-gray-900 mb-6 leading-tight" {
                            a href=(url) class="hover:text-blue-600 transition-colors" { (ctx.topic) }
                        }
                        div class="w-16 h-1 bg-blue-600 mx-auto rounded-full mb-8" {}
                        p class="text-xl text-gray-600 leading-relaxed font-light" { (ctx.data.introduction) }
                    }
                    @if !ctx.image_files.is_empty() {
                        div class="grid grid-cols-1 md:grid-cols-3 gap-4 mb-12" {
                            @for (i, file) in ctx.image_files.iter().enumerate() {
                                figure class="rounded-xl overflow-hidden shadow-lg hover:shadow-xl transition-shadow duration-300" {
                                    img src={ "./" (file) }
                                        class="w-full h-48 object-cover hover:scale-105 transition-transform duration-500"
                                        alt={ (ctx.topic) " 插图 " (i + 1) }
                                        loading="lazy";
                                }
                            }
                        }
                    }
                    div class="prose prose-lg prose-blue max-w-none text-gray-700" {
                        @for section in &ctx.data.sections {
                            div class="mb-10" {
                                h2 class="text-2xl font-bold text-gray-900 mb-4" { (section.heading) }
                                p class="leading-8 text-justify" { (section.content) }
                            }
                        }
                    }
                    footer class="mt-16 pt-8 border-t border-gray-200" {
                        div class="bg-blue-50 rounded-2xl p-8 text-center" {
                            h2 class="text-xl font-bold text-blue-900 mb-3" { "总结" }
                            p class="text-blue-800 mb-6" { (ctx.data.conclusion) }
                            a href=(url) class="inline-flex items-center justify-center bg-blue-600 text-white px-8 py-3 rounded-full font-bold hover:bg-blue-700 hover:shadow-lg transition-all" {
                                "了解更多详情 →"
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// README.md
// ============================================================================

/// Markdown mirror: intro, first image, then each section followed by the
/// image after it (section 1 → image 2, section 2 → image 3).
fn render_readme(ctx: &PageContext) -> String {
    let topic = ctx.topic;
    let url = ctx.redirect_url;
    let mut md = String::new();

    md.push_str(&format!("# [{topic}]({url})\n\n"));
    md.push_str(&format!("[# 👉 点击此处阅读完整详情]({url})\n\n"));
    md.push_str(&blockquote(&ctx.data.introduction));
    md.push_str("\n\n");

    if let Some(first) = ctx.image_files.first() {
        md.push_str(&format!("![{topic} 1](./{first})\n\n"));
    }

    for (idx, section) in ctx.data.sections.iter().enumerate() {
        md.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.content));
        if let Some(file) = ctx.image_files.get(idx + 1) {
            md.push_str(&format!("![{topic} {}](./{file})\n\n", idx + 2));
        }
    }

    md.push_str(&format!(
        "## 结论\n\n{}\n\n---\n\n[阅读全文]({url})",
        ctx.data.conclusion
    ));
    md
}

/// Quote every line so multi-paragraph text stays inside the blockquote.
fn blockquote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Auxiliary files
// ============================================================================

fn license_text(year: i32, holder: &str) -> String {
    format!(
        r#"MIT License

Copyright (c) {year} {holder}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE."#
    )
}

fn render_sitemap(redirect_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{}</loc></url>
</urlset>
"#,
        escape_xml(redirect_url)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
