//! # Pagesmith
//!
//! Turns a topic and a redirect URL into a one-page static site. A generative
//! AI service writes the article and draws up to three illustrations; the
//! result is packaged as a zip archive ready to drop on any static host. The
//! page redirects visitors to the target URL immediately while crawlers and
//! no-script readers still see the full article.
//!
//! # Architecture: One Run, Three Steps
//!
//! ```text
//! 1. Content    topic            →  GeneratedData   (one request, JSON schema)
//! 2. Images     image prompts    →  Vec<Image>      (sequential, delayed, lossy)
//! 3. Bundle     data + images    →  <slug>.zip      (pure, deterministic)
//! ```
//!
//! Steps 1 and 2 talk to the network through the [`backend::GenerativeBackend`]
//! trait; step 3 touches nothing but memory until the archive is written.
//! A finished [`pipeline::Run`] serializes to JSON, so packaging can be
//! retried, or a preview rendered, without asking the service again.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator: run state machine, image pacing, progress events |
//! | [`content`] | Step 1: prompt, response schema and parsing of the article |
//! | [`illustrate`] | Step 2: one image request; every failure becomes "absent" |
//! | [`bundle`] | Step 3: `index.html`, `README.md`, auxiliary files, zip archive |
//! | [`backend`] | Generative service seam and its Gemini REST implementation |
//! | [`preview`] | Self-contained HTML preview of a run |
//! | [`config`] | Layered `pagesmith.toml` loading, merging and validation |
//! | [`types`] | Content record and image payload shared by every step |
//! | [`naming`] | Topic slug and archive/image file names |
//! | [`output`] | CLI progress and packaging display |
//!
//! # Design Decisions
//!
//! ## Strictly Sequential Image Requests
//!
//! Image models are rate limited per minute. Requests go out one at a time
//! with a fixed pause between them (5 seconds by default, never before the
//! first). There is no retry and no backoff: a refused image is simply absent
//! from the site, and later images still get their chance.
//!
//! ## Content Failure Is Terminal, Image Failure Is Not
//!
//! Without an article there is nothing to package, so a failed or malformed
//! content response ends the run in the `error` state. Images are decoration:
//! the run completes with whatever subset arrived, including none.
//!
//! ## Escape Everything
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). The topic and all
//! model-written text are interpolated through Maud's auto-escaping, so an
//! article containing `<script>` renders as text instead of running.
//!
//! ## Contiguous Image Numbering
//!
//! Bundled images are numbered over the images actually obtained. If the
//! second of three prompts fails, the archive holds `-1.png` and `-2.png`,
//! and every reference in the HTML and Markdown points at a file that exists.

pub mod backend;
pub mod bundle;
pub mod config;
pub mod content;
pub mod illustrate;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
