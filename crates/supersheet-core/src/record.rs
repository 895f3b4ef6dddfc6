use crate::diagnostics::Diagnostic;
use crate::model::SectionKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Currency,
    Area,
    Percentage,
    Date,
    Integer,
    Address,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Text => "text",
            FieldKind::Currency => "currency",
            FieldKind::Area => "area",
            FieldKind::Percentage => "percentage",
            FieldKind::Date => "date",
            FieldKind::Integer => "integer",
            FieldKind::Address => "address",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "sq_ft")]
    SquareFeet,
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaUnit::SquareFeet => write!(f, "sq ft"),
        }
    }
}

/// A normalized value together with the unit or format it was normalized to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Text { text: String },
    Address { text: String },
    Currency { amount: Decimal, currency: String },
    Area { value: Decimal, unit: AreaUnit },
    /// Fraction in [0, 1] when in range; "95%" is stored as 0.95.
    Percentage { ratio: Decimal },
    /// `pattern` is the chrono format string that matched.
    Date { date: NaiveDate, pattern: String },
    Integer { value: i64 },
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text { .. } => FieldKind::Text,
            FieldValue::Address { .. } => FieldKind::Address,
            FieldValue::Currency { .. } => FieldKind::Currency,
            FieldValue::Area { .. } => FieldKind::Area,
            FieldValue::Percentage { .. } => FieldKind::Percentage,
            FieldValue::Date { .. } => FieldKind::Date,
            FieldValue::Integer { .. } => FieldKind::Integer,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text { text } | FieldValue::Address { text } => write!(f, "{text}"),
            FieldValue::Currency { amount, currency } => write!(f, "{amount} {currency}"),
            FieldValue::Area { value, unit } => write!(f, "{value} {unit}"),
            FieldValue::Percentage { ratio } => {
                write!(f, "{}%", (*ratio * Decimal::ONE_HUNDRED).normalize())
            }
            FieldValue::Date { date, .. } => write!(f, "{date}"),
            FieldValue::Integer { value } => write!(f, "{value}"),
        }
    }
}

/// Where in the document a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub page: usize,
    pub region: usize,
    pub section: SectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// A typed, normalized value with its raw text and a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    /// Text as it appeared in the document.
    pub raw: String,
    pub confidence: f64,
    pub provenance: Provenance,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// Numeric value for currency, area, percentage and integer fields.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match &self.value {
            FieldValue::Currency { amount, .. } => Some(*amount),
            FieldValue::Area { value, .. } => Some(*value),
            FieldValue::Percentage { ratio } => Some(*ratio),
            FieldValue::Integer { value } => Some(Decimal::from(*value)),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match &self.value {
            FieldValue::Integer { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text { text } | FieldValue::Address { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match &self.value {
            FieldValue::Date { date, .. } => Some(*date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyHeader {
    pub fields: BTreeMap<String, Field>,
}

impl PropertyHeader {
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Field::as_text)
    }

    /// The "Total Units" value as printed in the header, if it parsed.
    pub fn stated_total_units(&self) -> Option<i64> {
        self.get("total_units").and_then(Field::as_integer)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitMixRow {
    pub unit_type: Option<Field>,
    pub count: Option<Field>,
    pub size: Option<Field>,
    pub rent: Option<Field>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Field>,
}

impl UnitMixRow {
    pub fn unit_type_text(&self) -> Option<&str> {
        self.unit_type.as_ref().and_then(Field::as_text)
    }

    pub fn count_value(&self) -> Option<i64> {
        self.count.as_ref().and_then(Field::as_integer)
    }

    pub fn size_sqft(&self) -> Option<Decimal> {
        self.size.as_ref().and_then(Field::as_decimal)
    }

    pub fn rent_amount(&self) -> Option<Decimal> {
        self.rent.as_ref().and_then(Field::as_decimal)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentRollRow {
    pub unit: Option<Field>,
    pub unit_type: Option<Field>,
    pub tenant: Option<Field>,
    pub size: Option<Field>,
    pub rent: Option<Field>,
    pub lease_start: Option<Field>,
    pub lease_end: Option<Field>,
    pub status: Option<Field>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Field>,
}

impl RentRollRow {
    pub fn unit_text(&self) -> Option<&str> {
        self.unit.as_ref().and_then(Field::as_text)
    }

    pub fn rent_amount(&self) -> Option<Decimal> {
        self.rent.as_ref().and_then(Field::as_decimal)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub fields: BTreeMap<String, Field>,
    /// Rows whose label matched no known financial item, as raw text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

impl FinancialSummary {
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn amount(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(Field::as_decimal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// Mean confidence over all extracted fields (0 when there are none).
    pub overall: f64,
    pub field_count: usize,
    pub low_confidence_fields: usize,
    pub region_count: usize,
    pub unclassified_regions: usize,
}

/// The terminal output of the pipeline for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuperSheetRecord {
    pub header: PropertyHeader,
    pub unit_mix: Vec<UnitMixRow>,
    pub rent_roll: Vec<RentRollRow>,
    pub financials: FinancialSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Unit count summed from the unit mix, or the stated count when the
    /// unit mix cannot be summed.
    pub total_units: Option<i64>,
    /// Unit count printed in the header, kept as stated even when it disagrees.
    pub stated_total_units: Option<i64>,
    pub diagnostics: Vec<Diagnostic>,
    pub confidence: ConfidenceSummary,
}

impl SuperSheetRecord {
    /// All fields in the record, header first, in document order per section.
    pub fn all_fields(&self) -> Vec<&Field> {
        let mut out: Vec<&Field> = self.header.fields.values().collect();
        for row in &self.unit_mix {
            out.extend(
                [&row.unit_type, &row.count, &row.size, &row.rent]
                    .into_iter()
                    .flatten(),
            );
            out.extend(row.extra.values());
        }
        for row in &self.rent_roll {
            out.extend(
                [
                    &row.unit,
                    &row.unit_type,
                    &row.tenant,
                    &row.size,
                    &row.rent,
                    &row.lease_start,
                    &row.lease_end,
                    &row.status,
                ]
                .into_iter()
                .flatten(),
            );
            out.extend(row.extra.values());
        }
        out.extend(self.financials.fields.values());
        out
    }

    pub fn has_issue(&self, issue: crate::diagnostics::Issue) -> bool {
        self.diagnostics.iter().any(|d| d.issue == issue)
    }
}
