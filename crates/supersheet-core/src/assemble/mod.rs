pub mod validate;

use crate::config::schema::ExtractionConfig;
use crate::diagnostics::{Diagnostic, Issue};
use crate::model::{Region, SectionKind};
use crate::parsing::ExtractedFields;
use crate::record::{ConfidenceSummary, Field, FinancialSummary, PropertyHeader, SuperSheetRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Build the record from extracted fields and run the cross-field checks.
///
/// Always returns a record; every failed check becomes a diagnostic and no
/// extracted value is altered.
pub fn assemble(fields: ExtractedFields, regions: &[Region], config: &ExtractionConfig) -> SuperSheetRecord {
    let ExtractedFields {
        header,
        unit_mix,
        unit_mix_totals,
        rent_roll,
        financials,
        financial_unmatched,
        comments,
        mut diagnostics,
    } = fields;

    let header = keep_first(header, &mut diagnostics);
    let financials = keep_first(financials, &mut diagnostics);

    let mut record = SuperSheetRecord {
        header: PropertyHeader { fields: header },
        unit_mix,
        rent_roll,
        financials: FinancialSummary {
            fields: financials,
            unmatched: financial_unmatched,
        },
        comments,
        ..Default::default()
    };

    let stated = record.header.stated_total_units();
    let derived = validate::derived_unit_count(&record.unit_mix);
    record.stated_total_units = stated;
    record.total_units = derived.or(stated);

    diagnostics.extend(validate::reconcile_unit_counts(derived, stated, &unit_mix_totals));
    diagnostics.extend(validate::check_rent_roll_count(&record.rent_roll, stated));
    diagnostics.extend(validate::check_non_negative(&record, &config.signed_fields));
    diagnostics.extend(validate::sweep_low_confidence(&record, config.thresholds.low_confidence));

    record.confidence = summarize(&record, regions, config.thresholds.low_confidence);
    record.diagnostics = diagnostics;

    debug!(
        total_units = ?record.total_units,
        stated_total_units = ?record.stated_total_units,
        diagnostics = record.diagnostics.len(),
        overall = record.confidence.overall,
        "record assembled"
    );
    record
}

/// Index fields by name, keeping the first occurrence. A later occurrence
/// with a different value is reported as a conflict.
fn keep_first(fields: Vec<Field>, diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<String, Field> {
    let mut out: BTreeMap<String, Field> = BTreeMap::new();
    for field in fields {
        match out.get(&field.name) {
            Some(kept) if kept.value != field.value => {
                diagnostics.push(
                    Diagnostic::new(
                        format!("{}.{}", field.provenance.section, field.name),
                        Issue::ConflictingValue,
                        format!("kept '{}', ignored later value '{}'", kept.raw, field.raw),
                    )
                    .at(field.provenance),
                );
            }
            Some(_) => {}
            None => {
                out.insert(field.name.clone(), field);
            }
        }
    }
    out
}

fn summarize(record: &SuperSheetRecord, regions: &[Region], threshold: f64) -> ConfidenceSummary {
    let fields = record.all_fields();
    let overall = if fields.is_empty() {
        0.0
    } else {
        fields.iter().map(|f| f.confidence).sum::<f64>() / fields.len() as f64
    };
    ConfidenceSummary {
        overall,
        field_count: fields.len(),
        low_confidence_fields: fields.iter().filter(|f| f.confidence < threshold).count(),
        region_count: regions.len(),
        unclassified_regions: regions
            .iter()
            .filter(|r| r.kind == SectionKind::Unknown)
            .count(),
    }
}
