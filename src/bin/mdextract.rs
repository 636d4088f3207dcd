//! mdextract command-line interface.
//!
//! Thin shim over the library: parse flags, build an [`ExtractConfig`],
//! call the right entry point, write the Markdown out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mdextract::{EnhanceLevel, ExtractConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mdextract",
    version,
    about = "Extract Markdown-flavored text from HTML, PDF, DOCX, PPTX and images"
)]
struct Cli {
    /// Input document: a local file path or an http(s) URL
    input: String,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Declared mimetype of the input (e.g. "text/html"); guessed from the
    /// file extension when omitted
    #[arg(short, long)]
    mimetype: Option<String>,

    /// Skip OCR of embedded images
    #[arg(long)]
    no_images: bool,

    /// Keep navigation, footers and other page chrome
    #[arg(long)]
    keep_chrome: bool,

    /// Image preprocessing tier: 0 = off, 1 = upscale, 2 = binarize
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    enhance_level: u8,

    /// Emit a bare image tag for images that produced no text
    #[arg(long)]
    include_empty_images: bool,

    /// Minimum per-word OCR confidence (0-100)
    #[arg(long, default_value_t = 60.0)]
    ocr_confidence: f32,

    /// Timeout in seconds for page and image fetches
    #[arg(long, default_value_t = 2)]
    fetch_timeout: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ExtractConfig::builder()
        .extract_images(!cli.no_images)
        .strip_non_content(!cli.keep_chrome)
        .enhance_level(EnhanceLevel::from_numeric(cli.enhance_level))
        .include_empty_images(cli.include_empty_images)
        .ocr_confidence(cli.ocr_confidence)
        .fetch_timeout_secs(cli.fetch_timeout)
        .build()
        .context("invalid configuration")?;

    let markdown = if cli.input.starts_with("http://") || cli.input.starts_with("https://") {
        mdextract::extract_from_url(&cli.input, &config)
            .with_context(|| format!("failed to extract '{}'", cli.input))?
    } else {
        let path = PathBuf::from(&cli.input);
        mdextract::extract(&path, cli.mimetype.as_deref(), None, &config)
            .with_context(|| format!("failed to extract '{}'", path.display()))?
    };

    match cli.output {
        Some(path) => std::fs::write(&path, markdown)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{markdown}"),
    }
    Ok(())
}
