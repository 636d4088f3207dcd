//! Image acquisition: turn an `img src` value into a local file.
//!
//! Three source kinds are understood:
//!
//! * `data:image/...;base64,...` — decoded in place, no network.
//! * `http:` / `https:` — fetched with a short timeout and a browser
//!   User-Agent.
//! * `file:` — resolved to a local path, including `file://server/share`
//!   UNC forms.
//!
//! Downloaded and decoded payloads land under `<scratch>/images/` with a
//! content-derived name, so the same image referenced twice writes one file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ExtractConfig;
use crate::error::ImageError;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(?P<type>[\w.+-]+);base64,(?P<data>.*)$")
        .expect("data URI pattern compiles")
});

/// Resolve `src` to a local file, downloading or decoding as needed.
///
/// `file:` URIs resolve to their existing path; everything else is
/// materialised under `<scratch>/images/`.
pub(crate) fn acquire(
    src: &str,
    scratch: &Path,
    config: &ExtractConfig,
) -> Result<PathBuf, ImageError> {
    if src.starts_with("data:") {
        decode_data_uri(src, scratch)
    } else if src.starts_with("http://") || src.starts_with("https://") {
        download(src, scratch, config)
    } else if src.starts_with("file:") {
        resolve_file_uri(src)
    } else {
        Err(ImageError::UnsupportedScheme { src: src.to_string() })
    }
}

/// Decode a base64 `data:image/...` URI into `<scratch>/images/`.
fn decode_data_uri(src: &str, scratch: &Path) -> Result<PathBuf, ImageError> {
    let captures = DATA_URI
        .captures(src)
        .ok_or_else(|| ImageError::UnsupportedScheme { src: elided(src) })?;
    let subtype = &captures["type"];
    let bytes = base64::engine::general_purpose::STANDARD.decode(&captures["data"])?;
    let name = format!("{}.{}", content_hash(&bytes), extension_for(subtype));
    debug!("decoded {} byte data URI into {name}", bytes.len());
    write_image(scratch, &name, &bytes)
}

/// Fetch an HTTP(S) image into `<scratch>/images/`.
fn download(src: &str, scratch: &Path, config: &ExtractConfig) -> Result<PathBuf, ImageError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ImageError::Download {
            src: src.to_string(),
            reason: e.to_string(),
        })?;
    let response = client
        .get(src)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| ImageError::Download {
            src: src.to_string(),
            reason: e.to_string(),
        })?;
    let bytes = response.bytes().map_err(|e| ImageError::Download {
        src: src.to_string(),
        reason: e.to_string(),
    })?;
    let name = format!("{}.{}", content_hash_str(src), url_extension(src));
    debug!("downloaded {} bytes from '{src}' into {name}", bytes.len());
    write_image(scratch, &name, &bytes)
}

/// Resolve a `file:` URI to a local path. `file://server/share/x` forms
/// (a host component with no drive) map to UNC-style `//server/share/x`.
pub(crate) fn resolve_file_uri(src: &str) -> Result<PathBuf, ImageError> {
    let url = Url::parse(src).map_err(|_| ImageError::NotAFileUri { src: src.to_string() })?;
    if url.scheme() != "file" {
        return Err(ImageError::NotAFileUri { src: src.to_string() });
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => {
            Ok(PathBuf::from(format!("//{host}{}", url.path())))
        }
        _ => url
            .to_file_path()
            .map_err(|_| ImageError::NotAFileUri { src: src.to_string() }),
    }
}

// ── Naming ───────────────────────────────────────────────────────────────

/// Content-addressed stem for decoded payloads.
fn content_hash(bytes: &[u8]) -> String {
    sha1_smol::Sha1::from(bytes).hexdigest()
}

/// URL-addressed stem for downloads: two fetches of the same URL reuse the
/// same file name even if the server responds differently.
fn content_hash_str(s: &str) -> String {
    sha1_smol::Sha1::from(s.as_bytes()).hexdigest()
}

/// Map a data URI subtype to a file extension the decoder recognises.
/// Unknown subtypes fall back to `img`; the decoder sniffs bytes anyway.
fn extension_for(subtype: &str) -> &'static str {
    match subtype {
        "jpeg" | "jpg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "svg+xml" => "svg",
        _ => "img",
    }
}

/// Take the extension from the URL path, ignoring query and fragment.
fn url_extension(src: &str) -> String {
    let path = Url::parse(src)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| src.to_string());
    Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "img".to_string())
}

fn write_image(scratch: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ImageError> {
    let dir = scratch.join("images");
    fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

fn elided(src: &str) -> String {
    src.chars().take(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // 1x1 transparent PNG.
    const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn data_uri_decodes_to_png_file() {
        let dir = TempDir::new().unwrap();
        let src = format!("data:image/png;base64,{TINY_PNG_B64}");
        let path = acquire(&src, dir.path(), &ExtractConfig::default()).unwrap();
        assert!(path.is_file());
        assert_eq!(path.extension().unwrap(), "png");
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn same_payload_decodes_to_same_file() {
        let dir = TempDir::new().unwrap();
        let src = format!("data:image/png;base64,{TINY_PNG_B64}");
        let a = acquire(&src, dir.path(), &ExtractConfig::default()).unwrap();
        let b = acquire(&src, dir.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(fs::read_dir(dir.path().join("images")).unwrap().count(), 1);
    }

    #[test]
    fn unknown_subtype_gets_img_extension() {
        let dir = TempDir::new().unwrap();
        let src = format!("data:image/x-icon;base64,{TINY_PNG_B64}");
        let path = acquire(&src, dir.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(path.extension().unwrap(), "img");
    }

    #[test]
    fn corrupt_base64_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = acquire("data:image/png;base64,@@@", dir.path(), &ExtractConfig::default());
        assert!(matches!(err, Err(ImageError::InvalidPayload(_))));
    }

    #[test]
    fn ftp_scheme_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = acquire("ftp://example.com/x.png", dir.path(), &ExtractConfig::default());
        assert!(matches!(err, Err(ImageError::UnsupportedScheme { .. })));
    }

    #[test]
    fn file_uri_resolves_to_local_path() {
        let path = resolve_file_uri("file:///tmp/pic.png").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/pic.png"));
    }

    #[test]
    fn file_uri_with_host_resolves_to_unc_path() {
        let path = resolve_file_uri("file://server/share/pic.png").unwrap();
        assert_eq!(path, PathBuf::from("//server/share/pic.png"));
    }

    #[test]
    fn http_uri_is_not_a_file_uri() {
        let err = resolve_file_uri("http://example.com/x.png");
        assert!(matches!(err, Err(ImageError::NotAFileUri { .. })));
    }

    #[test]
    fn url_extension_strips_query() {
        assert_eq!(url_extension("https://cdn.example.com/a/b/logo.PNG?v=3"), "png");
        assert_eq!(url_extension("https://cdn.example.com/track"), "img");
    }
}
