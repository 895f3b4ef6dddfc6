use crate::model::SectionKind;
use crate::record::FieldKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thresholds, keyword dictionaries and lookup tables that drive extraction.
///
/// Loaded once and shared read-only by every stage of every document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub thresholds: Thresholds,
    pub classifier: ClassifierConfig,
    pub header_fields: Vec<LabeledFieldDef>,
    pub tables: TableDefs,
    pub financial_items: Vec<LabeledFieldDef>,
    #[serde(default)]
    pub total_row_labels: Vec<String>,
    pub date_patterns: Vec<String>,
    pub area_units: Vec<AreaUnitDef>,
    pub currency: CurrencyDef,
    #[serde(default)]
    pub signed_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Line clustering distance, as a fraction of the median fragment height.
    pub line_cluster_ratio: f32,
    /// Column clustering tolerance in points.
    pub column_tolerance: f32,
    /// Vertical gap that splits regions, in multiples of the median line height.
    pub region_gap_ratio: f32,
    /// Font size relative to the page median at which a line counts as a heading.
    pub heading_size_ratio: f32,
    /// How far (points) a fragment may overrun the next column before it is
    /// reported as a possible merged cell.
    pub merged_cell_slack: f32,
    /// Fields below this confidence (but above zero) get a diagnostic.
    pub low_confidence: f64,
    /// Minimum number of lines for a region to be considered tabular.
    pub min_table_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    Keyword,
    Positional,
    Structural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Rule tiers from strongest to weakest; the first tier with a candidate wins.
    pub precedence: Vec<RuleTier>,
    /// Section title phrases per section kind.
    pub anchors: BTreeMap<SectionKind, Vec<String>>,
}

/// A field located by a printed label ("Total Units:") or a row label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledFieldDef {
    pub field: String,
    pub kind: FieldKind,
    pub labels: Vec<String>,
}

/// A table column located by its header text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub field: String,
    pub kind: FieldKind,
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefs {
    pub unit_mix: Vec<ColumnDef>,
    pub rent_roll: Vec<ColumnDef>,
}

impl TableDefs {
    /// Column dictionary for a row-oriented section, if it has one.
    pub fn for_kind(&self, kind: SectionKind) -> Option<&[ColumnDef]> {
        match kind {
            SectionKind::UnitMix => Some(&self.unit_mix),
            SectionKind::RentRoll => Some(&self.rent_roll),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaUnitDef {
    pub tokens: Vec<String>,
    /// Square feet per one of this unit.
    pub square_feet: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyDef {
    pub code: String,
    pub symbols: Vec<String>,
}
