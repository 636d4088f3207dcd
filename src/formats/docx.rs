//! DOCX adapter: lift paragraph text with bold/italic run styling out of
//! `word/document.xml` into minimal HTML for the shared renderer.

use std::io::{Cursor, Read};

use crate::error::ExtractError;
use crate::formats::escape_html;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

fn conversion(detail: impl Into<String>) -> ExtractError {
    ExtractError::Conversion {
        format: "DOCX",
        detail: detail.into(),
    }
}

/// Convert DOCX bytes to minimal HTML: one `<p>` per paragraph, runs
/// wrapped in `<b>`/`<i>` where their properties say so.
pub(crate) fn docx_to_html(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| conversion(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| conversion(format!("no word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| conversion(e.to_string()))?;

    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut run_text = String::new();
    let mut in_run = false;
    let mut in_text = false;
    let mut bold = false;
    let mut italic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => paragraph.clear(),
                b"w:r" => {
                    in_run = true;
                    run_text.clear();
                    bold = false;
                    italic = false;
                }
                b"w:t" => in_text = true,
                b"w:b" if in_run => bold = toggle_on(&e)?,
                b"w:i" if in_run => italic = toggle_on(&e)?,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:b" if in_run => bold = toggle_on(&e)?,
                b"w:i" if in_run => italic = toggle_on(&e)?,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                run_text.push_str(&t.unescape().map_err(|e| conversion(e.to_string()))?);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => {
                    in_run = false;
                    let mut html = escape_html(&run_text);
                    if italic {
                        html = format!("<i>{html}</i>");
                    }
                    if bold {
                        html = format!("<b>{html}</b>");
                    }
                    paragraph.push_str(&html);
                }
                b"w:p" => paragraphs.push(format!("<p>{paragraph}</p>")),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(conversion(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    debug!("converted DOCX with {} paragraphs", paragraphs.len());
    Ok(format!("<html><body>{}</body></html>", paragraphs.join("\n")))
}

/// `<w:b/>` enables the toggle; an explicit `w:val` of `0` or `false`
/// disables it.
fn toggle_on(e: &quick_xml::events::BytesStart<'_>) -> Result<bool, ExtractError> {
    let attr = e
        .try_get_attribute("w:val")
        .map_err(|e| conversion(e.to_string()))?;
    match attr {
        Some(a) => {
            let v = a.unescape_value().map_err(|e| conversion(e.to_string()))?;
            Ok(v != "0" && v != "false")
        }
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_and_styling_lift_to_html() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>Plain text.</w:t></w:r></w:p>
                <w:p>
                  <w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r>
                  <w:r><w:rPr><w:i/></w:rPr><w:t> and italic</w:t></w:r>
                </w:p>
              </w:body>
            </w:document>"#;
        let html = docx_to_html(&docx_with(xml)).unwrap();
        assert!(html.contains("<p>Plain text.</p>"));
        assert!(html.contains("<b>Bold</b>"));
        assert!(html.contains("<i> and italic</i>"));
    }

    #[test]
    fn explicit_false_toggle_stays_plain() {
        let xml = r#"<w:document xmlns:w="http://x">
            <w:body><w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>NotBold</w:t></w:r></w:p></w:body>
          </w:document>"#;
        let html = docx_to_html(&docx_with(xml)).unwrap();
        assert!(html.contains("NotBold"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn run_text_is_escaped() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>a &lt; b</w:t></w:r></w:p>
          </w:body></w:document>"#;
        let html = docx_to_html(&docx_with(xml)).unwrap();
        assert!(html.contains("<p>a &lt; b</p>"));
    }

    #[test]
    fn missing_document_part_is_a_conversion_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nope").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let err = docx_to_html(&bytes);
        assert!(matches!(err, Err(ExtractError::Conversion { format: "DOCX", .. })));
    }

    #[test]
    fn not_a_zip_is_a_conversion_error() {
        let err = docx_to_html(b"garbage");
        assert!(matches!(err, Err(ExtractError::Conversion { .. })));
    }
}
