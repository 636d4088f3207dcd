//! # mdextract
//!
//! Convert heterogeneous documents (HTML pages, PDFs, DOCX, PPTX, images,
//! remote URLs referencing any of these) into Markdown-flavored text,
//! best-effort: noisy page chrome is pruned, wrong declared mimetypes are
//! re-guessed, and text locked inside images is recovered with OCR.
//!
//! ## Pipeline
//!
//! ```text
//! path / URL / bytes
//!        │
//!        ▼
//!  ┌─────────────┐  declared mime, else extension; one re-guess retry
//!  │ dispatcher  │────────────────────────────────────────────────┐
//!  └─────────────┘                                                │
//!    │HTML           │PDF / DOCX            │PPTX          │image │
//!    ▼               ▼                      ▼              ▼      │
//!  ┌─────────────┐ ┌──────────────┐  ┌─────────────┐ ┌──────────┐ │
//!  │ classifier  │ │ adapter      │  │ styled runs │ │ OCR      │ │
//!  │ (prune DOM) │ │ (to HTML)    │  │ to Markdown │ │ pipeline │ │
//!  └─────────────┘ └──────────────┘  └─────────────┘ └──────────┘ │
//!    │               │                      │              │      │
//!    ▼               ▼                      ▼              ▼      ▼
//!  ┌──────────────────────────┐
//!  │ Markdown renderer        │──────────► Markdown-flavored text
//!  │ (+ per-image OCR)        │
//!  └──────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mdextract::{extract_from_url, ExtractConfig};
//!
//! fn main() -> Result<(), mdextract::ExtractError> {
//!     let config = ExtractConfig::default();
//!     let markdown = extract_from_url("https://example.com/page", &config)?;
//!     println!("{markdown}");
//!     Ok(())
//! }
//! ```
//!
//! The library is fully synchronous. Failures of individual embedded
//! images are logged and degrade to empty text; only input-level problems
//! (missing file, failed page fetch, invalid config) surface as
//! [`ExtractError`].

pub mod config;
pub mod error;
pub mod extract;
pub mod html;
pub mod image;
pub mod mimetype;

pub(crate) mod formats;

pub use config::{EnhanceLevel, ExtractConfig, ExtractConfigBuilder};
pub use error::{ExtractError, ImageError};
pub use extract::{extract, extract_bytes, extract_from_url};
pub use html::markdown_from_html;
pub use mimetype::Mimetype;
