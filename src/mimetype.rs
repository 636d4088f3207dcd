//! Mimetype dispatch: route a document to the correct conversion path.
//!
//! A closed enum rather than a string-keyed table, so adding a format is a
//! compile-time-checked change and every `match` on [`Mimetype`] is forced
//! to handle the new variant.

use std::fmt;
use std::path::Path;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// The set of document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mimetype {
    Html,
    Pdf,
    Docx,
    Pptx,
    /// Any `image/*` subtype; the decoder sniffs the concrete format.
    Image,
}

impl Mimetype {
    /// Parse a mimetype string, e.g. from an HTTP `Content-Type` header.
    ///
    /// Parameters after `;` (charset and friends) are ignored. Returns
    /// `None` for anything we have no conversion path for.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence {
            "text/html" | "application/xhtml+xml" => Some(Mimetype::Html),
            "application/pdf" => Some(Mimetype::Pdf),
            m if m == DOCX_MIME => Some(Mimetype::Docx),
            m if m == PPTX_MIME => Some(Mimetype::Pptx),
            m if m.starts_with("image/") => Some(Mimetype::Image),
            _ => None,
        }
    }

    /// Guess the mimetype from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" | "xhtml" => Some(Mimetype::Html),
            "pdf" => Some(Mimetype::Pdf),
            "docx" => Some(Mimetype::Docx),
            "pptx" => Some(Mimetype::Pptx),
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "bmp" | "webp" | "tif" | "tiff" => {
                Some(Mimetype::Image)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Mimetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mimetype::Html => "text/html",
            Mimetype::Pdf => "application/pdf",
            Mimetype::Docx => DOCX_MIME,
            Mimetype::Pptx => PPTX_MIME,
            Mimetype::Image => "image/*",
        };
        f.write_str(s)
    }
}
