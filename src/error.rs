//! Error types for the mdextract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed at all
//!   (input file missing, whole-page fetch failed, invalid configuration).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single embedded image failed
//!   (download error, undecodable bytes, broken SVG). Caught at the stage
//!   boundary and converted into empty text for that image, so one bad
//!   image never aborts the document.
//!
//! Everything else — unsupported mimetype, over-aggressive pruning, OCR
//! producing nothing — is not an error at all: the pipeline degrades to an
//! empty string and logs instead. The top-level conversion always returns a
//! string (possibly empty) for anything it managed to open.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mdextract library.
///
/// Per-image failures use [`ImageError`] and never surface here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Network errors (page-level fetch only) ────────────────────────────
    /// The document URL itself could not be fetched. Image fetch failures
    /// are [`ImageError::Download`] and are non-fatal.
    #[error("failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The page fetch exceeded the configured timeout.
    #[error("fetch timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// A format adapter (PDF, DOCX, PPTX) could not convert the document.
    #[error("failed to convert {format} document: {detail}")]
    Conversion { format: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the scoped temporary directory or write into it.
    #[error("temporary file error: {0}")]
    TempFile(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single embedded image.
///
/// Produced by the acquisition / enhancement / OCR stages and logged at
/// warning level; the caller substitutes empty extracted text and moves on
/// to the next image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// HTTP download failed (connection error, timeout, non-2xx status).
    #[error("failed to retrieve image '{src}': {reason}")]
    Download { src: String, reason: String },

    /// `src` uses a scheme we cannot resolve (ftp:, mailto:, …).
    #[error("unsupported image source scheme: '{src}'")]
    UnsupportedScheme { src: String },

    /// A URI that must be a `file:` URI was something else.
    #[error("not a file URI: '{src}'")]
    NotAFileUri { src: String },

    /// The data-URI payload was not valid base64.
    #[error("invalid base64 payload in data URI: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    /// The acquired file vanished before it could be opened.
    #[error("image file not found: '{path}'")]
    Missing { path: PathBuf },

    /// The bytes could not be decoded as a known raster format.
    #[error("failed to decode image '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// SVG rasterisation failed (malformed SVG or renderer produced nothing).
    #[error("failed to rasterise SVG '{path}': {detail}")]
    SvgRender { path: PathBuf, detail: String },

    /// The tesseract invocation itself failed (binary missing, bad args).
    #[error("OCR failed: {detail}")]
    Ocr { detail: String },

    /// Filesystem error while spooling image bytes to the temp directory.
    #[error("image I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_timeout_display() {
        let e = ExtractError::FetchTimeout {
            url: "http://example.com/page".into(),
            secs: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("2s"), "got: {msg}");
        assert!(msg.contains("example.com"));
    }

    #[test]
    fn download_error_display() {
        let e = ImageError::Download {
            src: "https://example.com/logo.png".into(),
            reason: "HTTP 404".into(),
        };
        assert!(e.to_string().contains("HTTP 404"));
    }

    #[test]
    fn unsupported_scheme_display() {
        let e = ImageError::UnsupportedScheme {
            src: "ftp://example.com/x.png".into(),
        };
        assert!(e.to_string().contains("ftp://"));
    }
}
