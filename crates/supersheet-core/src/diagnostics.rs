use crate::record::Provenance;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    UnparseableValue,
    OutOfRange,
    MissingColumn,
    MissingHeaderRow,
    PossibleMergedCell,
    UnitCountMismatch,
    RentRollCountMismatch,
    NegativeValue,
    ConflictingValue,
    LowConfidence,
    UnclassifiedRegion,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Issue::UnparseableValue => "unparseable_value",
            Issue::OutOfRange => "out_of_range",
            Issue::MissingColumn => "missing_column",
            Issue::MissingHeaderRow => "missing_header_row",
            Issue::PossibleMergedCell => "possible_merged_cell",
            Issue::UnitCountMismatch => "unit_count_mismatch",
            Issue::RentRollCountMismatch => "rent_roll_count_mismatch",
            Issue::NegativeValue => "negative_value",
            Issue::ConflictingValue => "conflicting_value",
            Issue::LowConfidence => "low_confidence",
            Issue::UnclassifiedRegion => "unclassified_region",
        };
        write!(f, "{s}")
    }
}

/// A recorded, non-fatal problem attached to the output record for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Field (or region/table label) the issue concerns.
    pub field: String,
    pub issue: Issue,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Provenance>,
}

impl Diagnostic {
    pub fn new(field: impl Into<String>, issue: Issue, message: impl Into<String>) -> Self {
        let severity = match issue {
            Issue::UnitCountMismatch
            | Issue::RentRollCountMismatch
            | Issue::NegativeValue
            | Issue::UnparseableValue => Severity::Error,
            Issue::UnclassifiedRegion | Issue::ConflictingValue => Severity::Info,
            _ => Severity::Warning,
        };
        Diagnostic {
            field: field.into(),
            issue,
            message: message.into(),
            severity,
            location: None,
        }
    }

    pub fn at(mut self, location: Provenance) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.issue, self.message)
    }
}
