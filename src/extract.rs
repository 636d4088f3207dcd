//! Entry points: dispatch a document to the right conversion path.
//!
//! Mimetype resolution is deliberately forgiving. Declared mimetypes come
//! from HTTP headers and are frequently wrong (`application/octet-stream`
//! for everything, `text/html` for a PDF download), so when the declared
//! route yields no usable text the dispatcher re-guesses from the filename
//! and retries once.

use std::fs;
use std::path::Path;

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::formats::{docx, pdf, pptx};
use crate::html::markdown_from_html;
use crate::image;
use crate::mimetype::Mimetype;
use tempfile::TempDir;
use tracing::{debug, error, info};
use url::Url;

/// Extract Markdown-flavored text from a local file.
///
/// `mimetype` is a declared mimetype string if one is known (e.g. from a
/// `Content-Type` header); `url` is the document's origin, used to
/// absolutize relative links. Unknown mimetypes are not an error: they log
/// and yield an empty string, matching the best-effort contract.
pub fn extract(
    path: &Path,
    mimetype: Option<&str>,
    url: Option<&str>,
    config: &ExtractConfig,
) -> Result<String, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound { path: path.to_path_buf() });
    }

    let declared = mimetype.and_then(Mimetype::from_mime);
    let resolved = declared.or_else(|| Mimetype::from_path(path));
    let Some(resolved) = resolved else {
        error!(
            "no known mimetype for '{}' (declared: {mimetype:?}); returning empty text",
            path.display()
        );
        return Ok(String::new());
    };
    debug!("extracting '{}' as {resolved}", path.display());

    // Declared mimetypes lie; one re-guess from the filename before
    // accepting an empty result. A declared route whose adapter cannot
    // parse the bytes at all yields no usable text either, so it retries
    // the same way; the conversion error only surfaces when no different
    // guess exists.
    let text = match extract_as(path, resolved, url, config) {
        Ok(text) => text,
        Err(e @ ExtractError::Conversion { .. }) => {
            return match Mimetype::from_path(path) {
                Some(guessed) if guessed != resolved => {
                    info!("'{}' failed to convert as {resolved}; retrying as {guessed}", path.display());
                    extract_as(path, guessed, url, config)
                }
                _ => Err(e),
            };
        }
        Err(e) => return Err(e),
    };
    if !text.trim().is_empty() {
        return Ok(text);
    }

    match Mimetype::from_path(path) {
        Some(guessed) if guessed != resolved => {
            info!("'{}' produced no text as {resolved}; retrying as {guessed}", path.display());
            extract_as(path, guessed, url, config)
        }
        _ => Ok(text),
    }
}

/// Fetch a URL and extract it, using the response `Content-Type` as the
/// declared mimetype. The download lives in a temporary directory that is
/// removed when extraction finishes.
pub fn extract_from_url(url: &str, config: &ExtractConfig) -> Result<String, ExtractError> {
    let fetch_failed = |reason: String| ExtractError::FetchFailed {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| fetch_failed(e.to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| fetch_failed(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                ExtractError::FetchTimeout {
                    url: url.to_string(),
                    secs: config.fetch_timeout_secs,
                }
            } else {
                fetch_failed(e.to_string())
            }
        })?
        .error_for_status()
        .map_err(|e| fetch_failed(e.to_string()))?;

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().map_err(|e| fetch_failed(e.to_string()))?;
    info!("fetched {} bytes from '{url}' ({mime:?})", bytes.len());

    // Keep the URL's filename so the extension-based re-guess still works.
    let filename = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download");
    let temp = TempDir::new()?;
    let path = temp.path().join(filename);
    fs::write(&path, &bytes)?;

    extract(&path, mime.as_deref(), Some(url), config)
}

/// Extract from an in-memory buffer with a declared mimetype, spooling
/// through a managed temporary file.
pub fn extract_bytes(
    bytes: &[u8],
    mimetype: &str,
    config: &ExtractConfig,
) -> Result<String, ExtractError> {
    let suffix = Mimetype::from_mime(mimetype)
        .map(|m| file_suffix(m, mimetype))
        .unwrap_or("");
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    std::io::Write::write_all(&mut file, bytes)?;
    extract(file.path(), Some(mimetype), None, config)
}

fn file_suffix(resolved: Mimetype, mime: &str) -> &'static str {
    match resolved {
        Mimetype::Html => ".html",
        Mimetype::Pdf => ".pdf",
        Mimetype::Docx => ".docx",
        Mimetype::Pptx => ".pptx",
        Mimetype::Image if mime.contains("svg") => ".svg",
        Mimetype::Image => ".img",
    }
}

/// One conversion attempt with a fixed mimetype.
fn extract_as(
    path: &Path,
    mimetype: Mimetype,
    url: Option<&str>,
    config: &ExtractConfig,
) -> Result<String, ExtractError> {
    let read = || {
        fs::read(path).map_err(|source| ExtractError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })
    };
    match mimetype {
        Mimetype::Html => Ok(markdown_from_html(&read()?, url, config)),
        Mimetype::Pdf => {
            let html = pdf::pdf_to_html(&read()?)?;
            Ok(markdown_from_html(html.as_bytes(), None, config))
        }
        Mimetype::Docx => {
            let html = docx::docx_to_html(&read()?)?;
            Ok(markdown_from_html(html.as_bytes(), None, config))
        }
        Mimetype::Pptx => pptx::pptx_to_markdown(&read()?),
        Mimetype::Image => {
            let src = url
                .map(str::to_string)
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            Ok(image::extract_image_markdown(&src, path, "", config))
        }
    }
}
