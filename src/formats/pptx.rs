//! PPTX adapter: lift styled text runs out of slide XML and format them
//! straight to Markdown.
//!
//! Unlike PDF and DOCX there is no HTML intermediate: slides have no
//! meaningful document flow to prune, so each run maps directly to a
//! Markdown line.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::error::ExtractError;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

static SLIDE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("slide pattern compiles"));

/// Font size at or above which a run renders as a heading.
const HEADING_PT: f32 = 24.0;

/// One styled text run from a slide.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct PptxRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub hyperlink: Option<String>,
    pub size_pt: Option<f32>,
}

fn conversion(detail: impl Into<String>) -> ExtractError {
    ExtractError::Conversion {
        format: "PPTX",
        detail: detail.into(),
    }
}

/// Convert PPTX bytes to Markdown, one line per run, slides in deck order.
pub(crate) fn pptx_to_markdown(bytes: &[u8]) -> Result<String, ExtractError> {
    let runs = pptx_to_runs(bytes)?;
    Ok(runs.iter().map(run_markdown).collect::<Vec<_>>().join("\n"))
}

/// Extract every text run from every slide, slides ordered by number.
pub(crate) fn pptx_to_runs(bytes: &[u8]) -> Result<Vec<PptxRun>, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| conversion(e.to_string()))?;

    let mut slides: Vec<(u32, String)> = Vec::new();
    for name in archive.file_names() {
        if let Some(captures) = SLIDE_NAME.captures(name) {
            let number: u32 = captures[1].parse().map_err(|_| {
                conversion(format!("slide name '{name}' has a non-numeric index"))
            })?;
            slides.push((number, name.to_string()));
        }
    }
    slides.sort_by_key(|(number, _)| *number);
    debug!("PPTX archive holds {} slides", slides.len());

    let mut runs = Vec::new();
    for (number, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        let rels_name = format!("ppt/slides/_rels/slide{number}.xml.rels");
        let hyperlinks = match read_entry(&mut archive, &rels_name) {
            Ok(rels) => parse_relationships(&rels)?,
            // A slide without external links has no rels part to read.
            Err(_) => HashMap::new(),
        };
        parse_slide(&xml, &hyperlinks, &mut runs)?;
    }
    Ok(runs)
}

/// Format one run as a Markdown line. Styles stack in a fixed order, so a
/// bold hyperlink renders as `[**text**](url)`.
pub(crate) fn run_markdown(run: &PptxRun) -> String {
    let mut text = run.text.clone();
    if run.bold {
        text = format!("**{text}**");
    }
    if run.italic {
        text = format!("*{text}*");
    }
    if run.underline {
        text = format!("_{text}_");
    }
    if let Some(url) = &run.hyperlink {
        text = format!("[{text}]({url})");
    }
    if run.size_pt.is_some_and(|pt| pt >= HEADING_PT) {
        text = format!("# {text}");
    }
    text
}

// ── XML parsing ──────────────────────────────────────────────────────────

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut out = String::new();
    archive
        .by_name(name)
        .map_err(|e| conversion(format!("missing '{name}': {e}")))?
        .read_to_string(&mut out)
        .map_err(|e| conversion(e.to_string()))?;
    Ok(out)
}

/// Map relationship ids to their targets from a slide's `.rels` part.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, ExtractError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut map = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let id = attribute(&e, "Id")?;
                let target = attribute(&e, "Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    map.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(conversion(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(map)
}

fn parse_slide(
    xml: &str,
    hyperlinks: &HashMap<String, String>,
    runs: &mut Vec<PptxRun>,
) -> Result<(), ExtractError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut current: Option<PptxRun> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"a:r" => current = Some(PptxRun::default()),
                b"a:rPr" => {
                    if let Some(run) = current.as_mut() {
                        apply_run_properties(&e, run)?;
                    }
                }
                b"a:hlinkClick" => {
                    if let Some(run) = current.as_mut() {
                        if let Some(id) = attribute(&e, "r:id")? {
                            run.hyperlink = hyperlinks.get(&id).cloned();
                        }
                    }
                }
                b"a:t" => in_text = current.is_some(),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Some(run) = current.as_mut() {
                    run.text
                        .push_str(&t.unescape().map_err(|e| conversion(e.to_string()))?);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:r" => {
                    if let Some(run) = current.take() {
                        runs.push(run);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(conversion(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// `a:rPr` carries style flags as attributes: `b`/`i` as `0`/`1`,
/// underline as a style name (`none` disables), size in hundredths of a
/// point.
fn apply_run_properties(e: &BytesStart<'_>, run: &mut PptxRun) -> Result<(), ExtractError> {
    run.bold = attribute(e, "b")?.as_deref() == Some("1");
    run.italic = attribute(e, "i")?.as_deref() == Some("1");
    run.underline = attribute(e, "u")?.is_some_and(|u| u != "none");
    run.size_pt = attribute(e, "sz")?
        .and_then(|sz| sz.parse::<f32>().ok())
        .map(|hundredths| hundredths / 100.0);
    Ok(())
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ExtractError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|e| conversion(e.to_string()))?;
    match attr {
        Some(a) => Ok(Some(
            a.unescape_value()
                .map_err(|e| conversion(e.to_string()))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn run(text: &str) -> PptxRun {
        PptxRun {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_run_unchanged() {
        assert_eq!(run_markdown(&run("hello")), "hello");
    }

    #[test]
    fn styles_stack_in_fixed_order() {
        let r = PptxRun {
            bold: true,
            italic: true,
            underline: true,
            hyperlink: Some("http://x".into()),
            ..run("t")
        };
        assert_eq!(run_markdown(&r), "[_***t***_](http://x)");
    }

    #[test]
    fn large_runs_become_headings() {
        let heading = PptxRun {
            size_pt: Some(24.0),
            ..run("Title")
        };
        assert_eq!(run_markdown(&heading), "# Title");
        let body = PptxRun {
            size_pt: Some(23.5),
            ..run("Body")
        };
        assert_eq!(run_markdown(&body), "Body");
    }

    fn pptx_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const SLIDE_ONE: &str = r#"<p:sld xmlns:a="http://a" xmlns:p="http://p" xmlns:r="http://r">
        <p:txBody>
          <a:p>
            <a:r><a:rPr sz="3200" b="1"/><a:t>Deck Title</a:t></a:r>
          </a:p>
          <a:p>
            <a:r><a:rPr u="sng"/><a:t>underlined</a:t></a:r>
            <a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>link</a:t></a:r>
          </a:p>
        </p:txBody>
      </p:sld>"#;

    const SLIDE_ONE_RELS: &str = r#"<Relationships xmlns="http://rel">
        <Relationship Id="rId2" Type="http://hyperlink" Target="http://example.com/" TargetMode="External"/>
      </Relationships>"#;

    #[test]
    fn runs_carry_style_size_and_hyperlinks() {
        let bytes = pptx_with(&[
            ("ppt/slides/slide1.xml", SLIDE_ONE),
            ("ppt/slides/_rels/slide1.xml.rels", SLIDE_ONE_RELS),
        ]);
        let md = pptx_to_markdown(&bytes).unwrap();
        assert_eq!(
            md,
            "# **Deck Title**\n_underlined_\n[link](http://example.com/)"
        );
    }

    #[test]
    fn slides_sort_numerically_not_lexically() {
        let slide = |text: &str| {
            format!(r#"<p:sld xmlns:a="http://a"><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:sld>"#)
        };
        let s10 = slide("ten");
        let s2 = slide("two");
        let bytes = pptx_with(&[
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
        ]);
        assert_eq!(pptx_to_markdown(&bytes).unwrap(), "two\nten");
    }

    #[test]
    fn missing_rels_part_is_tolerated() {
        let bytes = pptx_with(&[("ppt/slides/slide1.xml", SLIDE_ONE)]);
        let md = pptx_to_markdown(&bytes).unwrap();
        assert!(md.contains("link"));
        assert!(!md.contains("example.com"));
    }

    #[test]
    fn not_a_zip_is_a_conversion_error() {
        let err = pptx_to_markdown(b"junk");
        assert!(matches!(err, Err(ExtractError::Conversion { format: "PPTX", .. })));
    }
}
