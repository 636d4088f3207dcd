//! Tesseract invocation and word-level confidence filtering.
//!
//! Whole-image recognition on noisy web images produces plausible-looking
//! garbage, so recognition runs in word-data mode and only words whose
//! confidence clears the configured threshold are kept.

use std::io::Cursor;

use crate::config::ExtractConfig;
use crate::error::ImageError;
use image::DynamicImage;
use tracing::debug;

/// Recognise text in a prepared bitmap, keeping only confident words.
pub(crate) fn recognize(img: &DynamicImage, config: &ExtractConfig) -> Result<String, ImageError> {
    // Spool through a temp PNG so the tesseract wrapper decodes its own
    // copy; its bundled image types need not match ours.
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ocr-input.png");
    let mut encoded = Vec::new();
    img.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
        .map_err(|e| ImageError::Ocr { detail: e.to_string() })?;
    std::fs::write(&path, &encoded)?;

    let input = rusty_tesseract::Image::from_path(path.to_string_lossy().as_ref())
        .map_err(|e| ImageError::Ocr { detail: e.to_string() })?;
    let args = rusty_tesseract::Args {
        // Assume a single column of text of variable sizes.
        psm: Some(4),
        oem: Some(3),
        ..Default::default()
    };
    let data = rusty_tesseract::image_to_data(&input, &args)
        .map_err(|e| ImageError::Ocr { detail: e.to_string() })?;

    let text = join_confident_words(
        data.data.iter().map(|d| (d.text.as_str(), d.conf)),
        config.ocr_confidence,
    );
    debug!(
        "OCR produced {} words, {} chars after confidence filter",
        data.data.len(),
        text.len()
    );
    Ok(text)
}

/// Space-join words whose confidence strictly exceeds `threshold`.
///
/// Negative confidences mark layout rows tesseract emits alongside words
/// (blocks, paragraphs, lines); they carry no text worth keeping. Blank
/// entries are separators.
pub(crate) fn join_confident_words<'a>(
    words: impl Iterator<Item = (&'a str, f32)>,
    threshold: f32,
) -> String {
    let kept: Vec<&str> = words
        .filter(|&(text, conf)| conf >= 0.0 && conf > threshold && !text.trim().is_empty())
        .map(|(text, _)| text)
        .collect();
    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_words_above_threshold() {
        let words = [("valid", 85.0), (" ", -1.0), ("words", 95.0)];
        assert_eq!(
            join_confident_words(words.iter().copied(), 60.0),
            "valid words"
        );
    }

    #[test]
    fn drops_words_at_or_below_threshold() {
        let words = [("low", 60.0), ("high", 60.1)];
        assert_eq!(join_confident_words(words.iter().copied(), 60.0), "high");
    }

    #[test]
    fn layout_rows_with_negative_confidence_are_skipped() {
        let words = [("block", -1.0), ("line", -1.0)];
        assert_eq!(join_confident_words(words.iter().copied(), 0.0), "");
    }

    #[test]
    fn blank_text_is_skipped_even_when_confident() {
        let words = [("", 99.0), ("   ", 99.0), ("word", 99.0)];
        assert_eq!(join_confident_words(words.iter().copied(), 60.0), "word");
    }

    #[test]
    fn all_below_threshold_yields_empty() {
        let words = [("maybe", 10.0), ("noise", 42.0)];
        assert_eq!(join_confident_words(words.iter().copied(), 60.0), "");
    }
}
