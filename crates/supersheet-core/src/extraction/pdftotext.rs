use crate::error::SuperSheetError;
use crate::extraction::{FragmentSource, PageFragments};
use crate::model::{BBox, Fragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// Fragment backend using `pdftotext -bbox-layout` (from poppler-utils).
///
/// pdftotext reports one box per word. Words on the same pdftotext line that
/// sit closer than `word_gap_ratio` times the word height are merged into one
/// fragment, so "Total Units:" stays a single phrase while table cells stay
/// apart. The bbox output has no font information; the font size is taken
/// from the word height and the weight is always normal.
pub struct PdftotextSource {
    word_gap_ratio: f32,
}

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource {
            word_gap_ratio: 0.5,
        }
    }

    pub fn with_word_gap_ratio(word_gap_ratio: f32) -> Self {
        PdftotextSource { word_gap_ratio }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentSource for PdftotextSource {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageFragments>, SuperSheetError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| SuperSheetError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| SuperSheetError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(tmpfile.path())
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SuperSheetError::PdftotextNotFound
                } else {
                    SuperSheetError::Extraction(format!("pdftotext -bbox-layout failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(SuperSheetError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xml(&xml, self.word_gap_ratio)?;
        debug!(
            pages = pages.len(),
            fragments = pages.iter().map(|p| p.fragments.len()).sum::<usize>(),
            "pdftotext output parsed"
        );
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[derive(Debug, Clone)]
struct Word {
    text: String,
    bbox: BBox,
}

/// Parse `pdftotext -bbox-layout` XHTML into fragments, one page per `<page>`
/// element in document order.
pub fn parse_bbox_xml(xml: &str, word_gap_ratio: f32) -> Result<Vec<PageFragments>, SuperSheetError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PageFragments> = Vec::new();
    let mut line_words: Vec<Word> = Vec::new();
    let mut word: Option<Word> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"page" => pages.push(PageFragments {
                    page_number: pages.len() + 1,
                    fragments: Vec::new(),
                }),
                b"line" => line_words.clear(),
                b"word" => {
                    word = word_box(e).map(|bbox| Word {
                        text: String::new(),
                        bbox,
                    })
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"page" => pages.push(PageFragments {
                page_number: pages.len() + 1,
                fragments: Vec::new(),
            }),
            Ok(Event::Text(ref e)) => {
                if let Some(w) = word.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| SuperSheetError::Extraction(format!("bad text in pdftotext output: {err}")))?;
                    w.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"word" => {
                    if let Some(w) = word.take().filter(|w| !w.text.trim().is_empty()) {
                        line_words.push(w);
                    }
                }
                b"line" => {
                    if let Some(page) = pages.last_mut() {
                        page.fragments
                            .extend(merge_words(std::mem::take(&mut line_words), word_gap_ratio));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SuperSheetError::Extraction(format!(
                    "invalid pdftotext XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn word_box(e: &BytesStart) -> Option<BBox> {
    let mut coords = [None; 4];
    for attr in e.attributes().flatten() {
        let slot = match attr.key.as_ref() {
            b"xMin" => 0,
            b"yMin" => 1,
            b"xMax" => 2,
            b"yMax" => 3,
            _ => continue,
        };
        coords[slot] = String::from_utf8_lossy(&attr.value).parse::<f32>().ok();
    }
    Some(BBox::new(coords[0]?, coords[1]?, coords[2]?, coords[3]?))
}

/// Join runs of closely spaced words into phrase fragments.
fn merge_words(words: Vec<Word>, gap_ratio: f32) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = Vec::new();
    let mut current: Option<(String, BBox)> = None;

    for w in words {
        let height = w.bbox.clamped().height();
        current = match current.take() {
            Some((text, bbox)) if w.bbox.x0 - bbox.x1 <= gap_ratio * height => {
                Some((format!("{text} {}", w.text.trim()), bbox.union(&w.bbox)))
            }
            Some(done) => {
                out.push(fragment(done));
                Some((w.text.trim().to_string(), w.bbox))
            }
            None => Some((w.text.trim().to_string(), w.bbox)),
        };
    }
    if let Some(done) = current {
        out.push(fragment(done));
    }
    out
}

fn fragment((text, bbox): (String, BBox)) -> Fragment {
    let font_size = bbox.clamped().height();
    Fragment::new(text, bbox, font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title></title></head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <flow>
      <block xMin="50.0" yMin="100.0" xMax="400.0" yMax="110.0">
        <line xMin="50.0" yMin="100.0" xMax="400.0" yMax="110.0">
          <word xMin="50.0" yMin="100.0" xMax="72.0" yMax="110.0">Total</word>
          <word xMin="74.0" yMin="100.0" xMax="100.0" yMax="110.0">Units:</word>
          <word xMin="102.0" yMin="100.0" xMax="112.0" yMax="110.0">15</word>
          <word xMin="300.0" yMin="100.0" xMax="340.0" yMax="110.0">R&amp;D</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="612.000000" height="792.000000">
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn test_pages_counted_in_order() {
        let pages = parse_bbox_xml(XML, 0.5).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
        assert!(pages[1].fragments.is_empty());
    }

    #[test]
    fn test_close_words_merge_into_phrases() {
        let pages = parse_bbox_xml(XML, 0.5).unwrap();
        let texts: Vec<&str> = pages[0].fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["Total Units: 15", "R&D"]);
        let first = &pages[0].fragments[0];
        assert_eq!(first.bbox.x0, 50.0);
        assert_eq!(first.bbox.x1, 112.0);
        assert_eq!(first.font_size, 10.0);
    }

    #[test]
    fn test_zero_gap_ratio_keeps_words_apart() {
        let pages = parse_bbox_xml(XML, 0.0).unwrap();
        assert_eq!(pages[0].fragments.len(), 4);
    }

    #[test]
    fn test_word_gap_ratio_is_configurable() {
        assert_eq!(PdftotextSource::new().word_gap_ratio, 0.5);
        let wide = PdftotextSource::with_word_gap_ratio(20.0);
        let pages = parse_bbox_xml(XML, wide.word_gap_ratio).unwrap();
        assert_eq!(pages[0].fragments.len(), 1);
        assert_eq!(pages[0].fragments[0].text, "Total Units: 15 R&D");
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_bbox_xml("<doc><page><line></page>", 0.5).unwrap_err();
        assert!(matches!(err, SuperSheetError::Extraction(_)));
    }
}
