use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box in page coordinates. The origin is the top-left corner of
/// the page and `y` grows downward, which is what pdftotext reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    /// Copy with inverted edges clamped so width and height are never negative.
    pub fn clamped(&self) -> BBox {
        BBox {
            x0: self.x0,
            y0: self.y0,
            x1: self.x1.max(self.x0),
            y1: self.y1.max(self.y0),
        }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// A single positioned piece of text decoded from a PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
}

impl Fragment {
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        Fragment {
            text: text.into(),
            bbox: bbox.clamped(),
            font_size,
            font_weight: FontWeight::Normal,
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = FontWeight::Bold;
        self
    }

    /// Height used for clustering. Zero-height boxes fall back to the font size.
    pub fn effective_height(&self) -> f32 {
        let h = self.bbox.height();
        if h > 0.0 {
            h
        } else {
            self.font_size.max(0.0)
        }
    }

    pub fn center_y(&self) -> f32 {
        self.bbox.y0 + self.effective_height() / 2.0
    }
}

/// Fragments sharing a vertical band, sorted left to right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub page: usize,
    pub fragments: Vec<Fragment>,
    pub bbox: BBox,
}

impl Line {
    /// Fragment texts joined with single spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn max_font_size(&self) -> f32 {
        self.fragments
            .iter()
            .map(|f| f.font_size)
            .fold(0.0, f32::max)
    }

    pub fn is_bold(&self) -> bool {
        !self.fragments.is_empty()
            && self
                .fragments
                .iter()
                .all(|f| f.font_weight == FontWeight::Bold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    UnitMix,
    RentRoll,
    Financials,
    Comments,
    Unknown,
}

impl SectionKind {
    /// Sections whose content is reconstructed as a table.
    pub fn is_tabular(&self) -> bool {
        matches!(
            self,
            SectionKind::UnitMix | SectionKind::RentRoll | SectionKind::Financials
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SectionKind::Header => "header",
            SectionKind::UnitMix => "unit_mix",
            SectionKind::RentRoll => "rent_roll",
            SectionKind::Financials => "financials",
            SectionKind::Comments => "comments",
            SectionKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A classified group of lines corresponding to one logical section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub page: usize,
    /// Position of the region on its page, top to bottom.
    pub index: usize,
    pub lines: Vec<Line>,
    pub bbox: BBox,
    pub kind: SectionKind,
    pub confidence: f64,
    /// Name of the classifier rule that decided the kind.
    pub rule: Option<String>,
    /// Number of leading lines that are section titles rather than content.
    pub title_lines: usize,
}

impl Region {
    /// Lines after the section title.
    pub fn content_lines(&self) -> &[Line] {
        let skip = self.title_lines.min(self.lines.len());
        &self.lines[skip..]
    }

    pub fn label(&self) -> String {
        format!("page {} region {}", self.page, self.index)
    }
}

/// Inferred horizontal extent of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub x_start: f32,
    pub x_end: f32,
}

/// Rows of cell text reconstructed from a tabular region.
///
/// Every row has exactly `columns.len()` cells; a missing cell is `""`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub kind: SectionKind,
    pub page: usize,
    pub region: usize,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bbox_is_clamped() {
        let b = BBox::new(50.0, 20.0, 40.0, 10.0).clamped();
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 0.0);
        assert_eq!(b.x1, 50.0);
    }

    #[test]
    fn test_zero_height_fragment_uses_font_size() {
        let f = Fragment::new("x", BBox::new(0.0, 100.0, 5.0, 100.0), 10.0);
        assert_eq!(f.effective_height(), 10.0);
        assert_eq!(f.center_y(), 105.0);
    }

    #[test]
    fn test_line_text_skips_blank_fragments() {
        let line = Line {
            page: 1,
            fragments: vec![
                Fragment::new("Unit", BBox::new(0.0, 0.0, 20.0, 10.0), 10.0),
                Fragment::new("  ", BBox::new(22.0, 0.0, 24.0, 10.0), 10.0),
                Fragment::new("Mix", BBox::new(26.0, 0.0, 40.0, 10.0), 10.0),
            ],
            bbox: BBox::new(0.0, 0.0, 40.0, 10.0),
        };
        assert_eq!(line.text(), "Unit Mix");
    }

    #[test]
    fn test_section_kind_display() {
        assert_eq!(SectionKind::RentRoll.to_string(), "rent_roll");
        assert!(SectionKind::Financials.is_tabular());
        assert!(!SectionKind::Header.is_tabular());
    }
}
