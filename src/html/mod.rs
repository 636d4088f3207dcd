//! Markdown renderer: flatten a parsed (and optionally pruned) HTML tree
//! into a Markdown-flavored string.
//!
//! ## Why rewrite in place?
//!
//! Each rewriting step (links, headings, emphasis, lists, image text)
//! replaces DOM structure with plain text nodes, so the final step is a
//! single document-order walk over the remaining text. Order matters:
//! URL absolutization must run before links are flattened into `[t](href)`
//! text, and image text is inserted before the walk so it lands in document
//! position.

pub mod classify;

use crate::config::ExtractConfig;
use crate::image;
use kuchikikiki::traits::TendrilSink;
use kuchikikiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;
use tracing::{debug, warn};
use url::Url;

/// Text under these tags is never part of the visible output.
const HIDDEN_PARENTS: [&str; 5] = ["style", "script", "head", "title", "meta"];

static COLLAPSE_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline collapse pattern compiles"));
static COLLAPSE_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {3,}").expect("space collapse pattern compiles"));

/// Convert an HTML document to Markdown-flavored text.
///
/// `base_url`, when given, is used to absolutize relative `href`/`src`
/// attributes before rendering. Boilerplate pruning and per-image OCR are
/// gated by `config`.
pub fn markdown_from_html(body: &[u8], base_url: Option<&str>, config: &ExtractConfig) -> String {
    let html = String::from_utf8_lossy(body);
    let doc = kuchikikiki::parse_html().one(html.as_ref());
    debug!("parsed HTML document ({} bytes)", body.len());

    if config.strip_non_content {
        classify::strip_chrome(&doc);
        debug!("stripped non-content chrome");
    }

    if let Some(base) = base_url {
        absolutize_urls(&doc, base);
    }

    links_to_markdown(&doc);
    headings_to_markdown(&doc);
    emphasis_to_markdown(&doc);
    lists_to_markdown(&doc);

    if config.extract_images {
        images_to_text(&doc, config);
    }

    let joined = visible_text(&doc).join("\n");
    collapse_whitespace(&joined)
}

// ── Rewriting steps ──────────────────────────────────────────────────────

/// Rewrite relative `a[href]` and `img[src]` attributes against `base`.
fn absolutize_urls(doc: &NodeRef, base: &str) {
    let Ok(base) = Url::parse(base) else {
        debug!("base URL '{base}' did not parse; leaving links relative");
        return;
    };
    for (selector, attr) in [("a", "href"), ("img", "src")] {
        for node in select_all(doc, selector) {
            let Some(element) = node.as_element() else { continue };
            let mut attributes = element.attributes.borrow_mut();
            let Some(value) = attributes.get(attr).map(str::to_string) else {
                continue;
            };
            if let Ok(absolute) = base.join(&value) {
                attributes.insert(attr, absolute.to_string());
            }
        }
    }
}

/// Replace every anchor carrying a non-empty `href` with `[text](href)`.
/// Anchors without one are left alone; their children's text still renders.
fn links_to_markdown(doc: &NodeRef) {
    for node in select_all(doc, "a") {
        let href = node
            .as_element()
            .and_then(|e| e.attributes.borrow().get("href").map(str::to_string));
        let Some(href) = href.filter(|h| !h.is_empty()) else {
            continue;
        };
        let text = node.text_contents();
        replace_with_text(&node, format!("[{text}]({href})"));
    }
}

/// Replace `h1`–`h6` with `#`-prefixed heading lines.
fn headings_to_markdown(doc: &NodeRef) {
    for level in 1..=6usize {
        for node in select_all(doc, &format!("h{level}")) {
            let text = node.text_contents();
            replace_with_text(&node, format!("{} {}", "#".repeat(level), text));
        }
    }
}

/// Replace bold with `**text**` and italic with `*text*`.
fn emphasis_to_markdown(doc: &NodeRef) {
    for node in select_all(doc, "b, strong") {
        let text = node.text_contents();
        replace_with_text(&node, format!("**{text}**"));
    }
    for node in select_all(doc, "i, em") {
        let text = node.text_contents();
        replace_with_text(&node, format!("*{text}*"));
    }
}

/// Flatten list items to `* item` / `1. item` lines, then unwrap the list
/// wrappers, promoting the rewritten items into the parent.
fn lists_to_markdown(doc: &NodeRef) {
    for ul in select_all(doc, "ul") {
        for li in select_all(&ul, "li") {
            let text = li.text_contents();
            replace_with_text(&li, format!("* {text}\n"));
        }
    }
    for ol in select_all(doc, "ol") {
        for (index, li) in select_all(&ol, "li").into_iter().enumerate() {
            let text = li.text_contents();
            replace_with_text(&li, format!("{}. {text}\n", index + 1));
        }
    }
    for list in select_all(doc, "ul, ol") {
        unwrap_node(&list);
    }
}

/// Run the image pipeline for every `img[src]`, inserting any extracted
/// Markdown right after the tag. Downloads land in a directory that is
/// removed when this function returns, success or not.
fn images_to_text(doc: &NodeRef, config: &ExtractConfig) {
    let images = select_all(doc, "img");
    if images.is_empty() {
        return;
    }
    let scratch = match TempDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("could not create image scratch directory: {e}; skipping image text");
            return;
        }
    };

    for img in images {
        let Some(element) = img.as_element() else { continue };
        let (src, alt) = {
            let attributes = element.attributes.borrow();
            let Some(src) = attributes.get("src").map(str::to_string) else {
                continue;
            };
            let alt = attributes.get("alt").unwrap_or("").to_string();
            (src, alt)
        };
        if src.is_empty() {
            continue;
        }

        let markdown = image::download_and_extract(&src, scratch.path(), &alt, config);
        if markdown.is_empty() {
            continue;
        }
        // The img element itself bears no text, so it can stay in the tree.
        img.insert_after(NodeRef::new_text(markdown));
    }
}

// ── Flattening ───────────────────────────────────────────────────────────

/// All visible text pieces in document order, each trimmed. Empty pieces
/// are kept; the whitespace collapse pass squeezes the resulting blank
/// lines afterwards.
pub(crate) fn visible_text(doc: &NodeRef) -> Vec<String> {
    let mut pieces = Vec::new();
    for node in doc.descendants() {
        if let Some(text) = node.as_text() {
            if text_is_visible(&node) {
                pieces.push(text.borrow().trim().to_string());
            }
        }
    }
    pieces
}

/// True when the document has no visible text at all. The classifier's
/// rollback compares against zero, not against structural equality.
pub(crate) fn visible_text_is_empty(doc: &NodeRef) -> bool {
    !visible_text(doc).iter().any(|piece| !piece.is_empty())
}

fn text_is_visible(node: &NodeRef) -> bool {
    match node.parent() {
        // Text directly under the document wrapper does not render.
        Some(parent) => match parent.as_element() {
            Some(element) => !HIDDEN_PARENTS.contains(&element.name.local.as_ref()),
            None => false,
        },
        None => false,
    }
}

/// Collapse runs of 3+ newlines to 2 and 3+ spaces to 2, then trim.
/// Idempotent: applying it twice equals applying it once.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    let collapsed = COLLAPSE_NEWLINES.replace_all(text, "\n\n");
    let collapsed = COLLAPSE_SPACES.replace_all(&collapsed, "  ");
    collapsed.trim().to_string()
}

// ── DOM helpers ──────────────────────────────────────────────────────────

/// Matching elements in document order, collected so the tree can be
/// mutated while iterating.
fn select_all(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match root.select(selector) {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    }
}

/// Swap an element for a plain text node in the same position.
fn replace_with_text(node: &NodeRef, text: String) {
    node.insert_after(NodeRef::new_text(text));
    node.detach();
}

/// Remove an element, promoting its children into its place.
fn unwrap_node(node: &NodeRef) {
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        node.insert_before(child);
    }
    node.detach();
}
