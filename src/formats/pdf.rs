//! PDF adapter: extract plain text and wrap it in minimal HTML so the PDF
//! path shares the HTML renderer with everything else.

use crate::error::ExtractError;
use crate::formats::escape_html;
use tracing::debug;

/// Convert PDF bytes to minimal HTML, one `<p>` per paragraph.
///
/// The extraction library panics on some malformed files, so the call runs
/// under `catch_unwind` and a panic is reported as a conversion error
/// rather than taking the process down.
pub(crate) fn pdf_to_html(bytes: &[u8]) -> Result<String, ExtractError> {
    let conversion = |detail: String| ExtractError::Conversion {
        format: "PDF",
        detail,
    };

    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| conversion("extraction panicked".into()))?
        .map_err(|e| conversion(e.to_string()))?;
    debug!("extracted {} chars of PDF text", text.len());

    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect();
    Ok(format!("<html><body>{}</body></html>", paragraphs.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_is_a_conversion_error() {
        let err = pdf_to_html(b"definitely not a pdf");
        assert!(matches!(err, Err(ExtractError::Conversion { format: "PDF", .. })));
    }
}
