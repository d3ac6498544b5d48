//! Read-only preview of a run.
//!
//! A single self-contained HTML file: images are inlined as data URIs so the
//! page opens straight from disk, before anything is packaged. Unlike the
//! bundled `index.html` it never redirects.
//!
//! Section bodies are rendered as Markdown. Raw HTML inside the model's text
//! is demoted to plain text before rendering, so the preview shows markup
//! the model emitted instead of executing it.

use crate::pipeline::Run;
use crate::types::{GeneratedData, Image};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Parser, html as md_html};

/// Preview page for a run, or `None` while it has no content yet.
pub fn render_run(run: &Run) -> Option<Markup> {
    run.data
        .as_ref()
        .map(|data| render_preview(&run.topic, &run.redirect_url, data, &run.images))
}

pub fn render_preview(
    topic: &str,
    redirect_url: &str,
    data: &GeneratedData,
    images: &[Image],
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="zh-CN" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "预览: " (topic) }
                script src="https://cdn.tailwindcss.com" {}
            }
            body class="bg-gray-100 py-10" {
                main class="max-w-4xl mx-auto bg-white rounded-2xl shadow p-8 md:p-12" {
                    header class="mb-10 border-b border-gray-100 pb-8" {
                        p class="text-sm text-gray-400 mb-2" { "跳转目标: " (redirect_url) }
                        p class="text-sm text-gray-400 mb-2" { "关键词: " (topic) }
                        h1 class="text-4xl font-extrabold text-gray-900 mb-6" { (data.title) }
                        p class="text-xl text-gray-600 leading-relaxed" { (data.introduction) }
                    }
                    @if !images.is_empty() {
                        div class="grid grid-cols-1 md:grid-cols-3 gap-4 mb-10" {
                            @for (i, image) in images.iter().enumerate() {
                                figure class="rounded-xl overflow-hidden shadow-md" {
                                    img src=(image.to_data_uri())
                                        class="w-full h-48 object-cover"
                                        alt={ (topic) " 插图 " (i + 1) };
                                }
                            }
                        }
                    }
                    @for (i, section) in data.sections.iter().enumerate() {
                        section class="mb-10" {
                            h2 class="text-2xl font-bold text-gray-800 mb-4 flex items-center" {
                                span class="bg-blue-100 text-blue-600 w-8 h-8 rounded-full flex items-center justify-center text-sm mr-3" {
                                    (i + 1)
                                }
                                (section.heading)
                            }
                            div class="prose prose-lg text-gray-700" {
                                (PreEscaped(markdown_to_html(&section.content)))
                            }
                        }
                    }
                    aside class="bg-gray-50 border-l-4 border-blue-500 p-6 rounded-r-lg" {
                        h3 class="font-bold text-gray-900 mb-2" { "结论" }
                        p class="text-gray-700" { (data.conclusion) }
                    }
                }
            }
        }
    }
}

/// Markdown to HTML with embedded HTML shown as text.
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}
