//! Image-to-text pipeline: acquisition, enhancement, OCR and Markdown
//! re-embedding.
//!
//! ## Why a best-effort pipeline?
//!
//! Pages embed images from every kind of source: data URIs, relative paths,
//! CDNs that 403 unknown clients, SVG logos, decorative spacers. Any single
//! image failing must never take the document down, so every stage returns
//! a [`ImageError`](crate::error::ImageError) that the entry points catch,
//! log and flatten to empty extracted text.
//!
//! Stage order per image:
//!
//! ```text
//! src attr ──► acquire (data URI / HTTP / file URI) ──► local file
//!          ──► decode + enhance (tiered)             ──► bitmap
//!          ──► tesseract word data                   ──► confident words
//!          ──► Markdown fragment
//! ```

pub(crate) mod acquire;
pub(crate) mod enhance;
pub(crate) mod ocr;

use std::path::Path;

use crate::config::ExtractConfig;
use tracing::{debug, error, warn};

/// Acquire `src` into `scratch`, OCR it and format the result as Markdown.
///
/// This is the whole per-image pipeline behind one call. Acquisition and
/// extraction failures are logged and degrade to empty text, so the return
/// value is always a (possibly empty) Markdown fragment.
pub fn download_and_extract(
    src: &str,
    scratch: &Path,
    alt: &str,
    config: &ExtractConfig,
) -> String {
    let local = match acquire::acquire(src, scratch, config) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("could not acquire image '{}': {e}", elide(src));
            None
        }
    };
    match local {
        Some(path) if path.is_file() => extract_image_markdown(src, &path, alt, config),
        Some(path) => {
            error!("acquired image is not a file: '{}'", path.display());
            image_markdown(src, alt, "", config.include_empty_images)
        }
        None => image_markdown(src, alt, "", config.include_empty_images),
    }
}

/// OCR an already-local image file and format it as Markdown.
///
/// Used both from the HTML renderer (after download) and directly when the
/// whole input document is an image.
pub fn extract_image_markdown(
    src: &str,
    local_path: &Path,
    alt: &str,
    config: &ExtractConfig,
) -> String {
    let extracted = enhance::extract_text(local_path, config);
    debug!(
        "image '{}': {} chars of recognised text",
        elide(src),
        extracted.len()
    );
    image_markdown(src, alt, &extracted, config.include_empty_images)
}

/// Format one image as a Markdown fragment.
///
/// * No alt and no text: nothing, or a bare `![](src)` when
///   `include_empty` is set.
/// * Data URIs: the multi-kilobyte payload is replaced with the
///   placeholder `local.img`; recognised text rides in the title.
/// * Short recognised text (< 255 chars) becomes the link title; longer
///   text is appended as an `image-text` fenced block after the tag.
fn image_markdown(src: &str, alt: &str, extracted: &str, include_empty: bool) -> String {
    let extracted = extracted.trim();
    if alt.is_empty() && extracted.is_empty() {
        return if include_empty {
            format!("![]({src})")
        } else {
            String::new()
        };
    }

    if src.starts_with("data:image") {
        return if extracted.is_empty() {
            format!("![{alt}](local.img)")
        } else {
            format!("![{alt}](local.img \"{}\")", sanitize_title(extracted))
        };
    }

    if extracted.is_empty() {
        format!("![{alt}]({src})")
    } else if extracted.chars().count() < 255 {
        format!("![{alt}]({src} \"{}\")", sanitize_title(extracted))
    } else {
        format!(
            "![{alt}]({src})```image-text\n{}```",
            extracted.replace("```", "~~~")
        )
    }
}

/// Double quotes would terminate the Markdown title early.
fn sanitize_title(text: &str) -> String {
    text.replace('"', "'")
}

/// Data URIs can be hundreds of kilobytes; keep log lines readable.
fn elide(src: &str) -> String {
    if src.len() > 80 {
        let cut = (0..=77).rev().find(|&i| src.is_char_boundary(i)).unwrap_or(0);
        format!("{}…", &src[..cut])
    } else {
        src.to_string()
    }
}
