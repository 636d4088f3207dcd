//! Format adapters: thin conversions from PDF, DOCX and PPTX into what the
//! HTML renderer (or, for PPTX, the Markdown output directly) consumes.
//!
//! These are deliberately shallow. Structural parsing belongs to the
//! underlying libraries; the adapters only lift text and the handful of
//! style attributes the Markdown output can represent.

pub(crate) mod docx;
pub(crate) mod pdf;
pub(crate) mod pptx;

/// Minimal HTML escaping for text destined for generated markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
