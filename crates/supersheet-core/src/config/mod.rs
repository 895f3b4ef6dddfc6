pub mod builtin;
pub mod schema;

use crate::error::SuperSheetError;
use crate::model::SectionKind;
use schema::{ColumnDef, ExtractionConfig, RuleTier};
use std::collections::HashSet;
use std::path::Path;

pub use schema::Thresholds;

/// Load an extraction config from a JSON file.
pub fn load_config(path: &Path) -> Result<ExtractionConfig, SuperSheetError> {
    let content = std::fs::read_to_string(path).map_err(|e| SuperSheetError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an extraction config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ExtractionConfig, SuperSheetError> {
    let config: ExtractionConfig =
        serde_json::from_str(json).map_err(|e| SuperSheetError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an extraction config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<ExtractionConfig, SuperSheetError> {
    let config: ExtractionConfig = serde_json::from_str(json).map_err(SuperSheetError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is internally consistent.
pub fn validate_config(config: &ExtractionConfig) -> Result<(), SuperSheetError> {
    let t = &config.thresholds;
    let positive = [
        ("line_cluster_ratio", t.line_cluster_ratio),
        ("column_tolerance", t.column_tolerance),
        ("region_gap_ratio", t.region_gap_ratio),
        ("heading_size_ratio", t.heading_size_ratio),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "threshold '{name}' must be a positive number, got {value}"
            )));
        }
    }
    if !(t.merged_cell_slack.is_finite() && t.merged_cell_slack >= 0.0) {
        return Err(SuperSheetError::ConfigInvalid(
            "threshold 'merged_cell_slack' must not be negative".into(),
        ));
    }
    if !(0.0..=1.0).contains(&t.low_confidence) {
        return Err(SuperSheetError::ConfigInvalid(format!(
            "threshold 'low_confidence' must be within [0, 1], got {}",
            t.low_confidence
        )));
    }
    if t.min_table_lines == 0 {
        return Err(SuperSheetError::ConfigInvalid(
            "threshold 'min_table_lines' must be at least 1".into(),
        ));
    }

    let precedence = &config.classifier.precedence;
    for tier in [RuleTier::Keyword, RuleTier::Positional, RuleTier::Structural] {
        let n = precedence.iter().filter(|t| **t == tier).count();
        if n != 1 {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "classifier precedence must list tier '{tier:?}' exactly once (found {n})"
            )));
        }
    }

    for kind in [
        SectionKind::Header,
        SectionKind::UnitMix,
        SectionKind::RentRoll,
        SectionKind::Financials,
        SectionKind::Comments,
    ] {
        let anchors = config.classifier.anchors.get(&kind);
        if anchors.map_or(true, |a| a.iter().all(|s| s.trim().is_empty())) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "no anchor keywords for section '{kind}'"
            )));
        }
    }
    if config.classifier.anchors.contains_key(&SectionKind::Unknown) {
        return Err(SuperSheetError::ConfigInvalid(
            "section 'unknown' cannot have anchor keywords".into(),
        ));
    }

    for def in config.header_fields.iter().chain(&config.financial_items) {
        if def.field.is_empty() {
            return Err(SuperSheetError::ConfigInvalid(
                "field name must not be empty".into(),
            ));
        }
        if def.labels.iter().all(|l| l.trim().is_empty()) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "field '{}' has no labels",
                def.field
            )));
        }
    }

    validate_columns("unit_mix", &config.tables.unit_mix, &["unit_type", "count"])?;
    validate_columns("rent_roll", &config.tables.rent_roll, &["unit"])?;

    if config.date_patterns.is_empty() || config.date_patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(SuperSheetError::ConfigInvalid(
            "date_patterns must be a non-empty list of non-empty patterns".into(),
        ));
    }

    if config.area_units.is_empty() {
        return Err(SuperSheetError::ConfigInvalid(
            "area_units must not be empty".into(),
        ));
    }
    for unit in &config.area_units {
        if unit.square_feet <= rust_decimal::Decimal::ZERO {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "area unit {:?} must have a positive square-feet factor",
                unit.tokens
            )));
        }
        if unit.tokens.is_empty() {
            return Err(SuperSheetError::ConfigInvalid(
                "area unit must list at least one token".into(),
            ));
        }
    }

    if config.currency.code.trim().is_empty() {
        return Err(SuperSheetError::ConfigInvalid(
            "currency code must not be empty".into(),
        ));
    }

    Ok(())
}

fn validate_columns(
    table: &str,
    columns: &[ColumnDef],
    required_fields: &[&str],
) -> Result<(), SuperSheetError> {
    let mut seen = HashSet::new();
    for col in columns {
        if !seen.insert(col.field.as_str()) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "table '{table}' defines column '{}' twice",
                col.field
            )));
        }
        if col.synonyms.iter().all(|s| s.trim().is_empty()) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "column '{}' in table '{table}' has no header synonyms",
                col.field
            )));
        }
    }
    for field in required_fields {
        if !seen.contains(field) {
            return Err(SuperSheetError::ConfigInvalid(format!(
                "table '{table}' must define a '{field}' column"
            )));
        }
    }
    Ok(())
}
