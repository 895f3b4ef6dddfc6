use crate::diagnostics::{Diagnostic, Issue};
use crate::record::{Field, FieldKind, RentRollRow, SuperSheetRecord, UnitMixRow};
use rust_decimal::Decimal;

/// Sum of unit-mix counts, when every row has a parsed count and the sum
/// fits in an i64.
pub fn derived_unit_count(unit_mix: &[UnitMixRow]) -> Option<i64> {
    if unit_mix.is_empty() {
        return None;
    }
    unit_mix
        .iter()
        .map(UnitMixRow::count_value)
        .try_fold(0i64, |acc, c| acc.checked_add(c?))
}

/// Compare the unit-mix sum with the header's stated total and any totals row.
///
/// Neither value is changed; each disagreement is one diagnostic.
pub fn reconcile_unit_counts(derived: Option<i64>, stated: Option<i64>, totals_rows: &[Field]) -> Vec<Diagnostic> {
    let Some(derived) = derived else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(stated) = stated {
        if stated != derived {
            out.push(Diagnostic::new(
                "header.total_units",
                Issue::UnitCountMismatch,
                format!("header states {stated} units but the unit mix sums to {derived}"),
            ));
        }
    }
    for total in totals_rows {
        if let Some(printed) = total.as_integer() {
            if printed != derived {
                out.push(
                    Diagnostic::new(
                        "unit_mix.count",
                        Issue::UnitCountMismatch,
                        format!("unit mix totals row shows {printed} units but its rows sum to {derived}"),
                    )
                    .at(total.provenance),
                );
            }
        }
    }
    out
}

/// Rent-roll rows should match the stated unit total, one row per unit.
pub fn check_rent_roll_count(rent_roll: &[RentRollRow], stated: Option<i64>) -> Option<Diagnostic> {
    let stated = stated?;
    if rent_roll.is_empty() || rent_roll.len() as i64 == stated {
        return None;
    }
    Some(Diagnostic::new(
        "rent_roll",
        Issue::RentRollCountMismatch,
        format!(
            "rent roll lists {} units but the header states {stated}",
            rent_roll.len()
        ),
    ))
}

/// Currency and area values must not be negative, except for `signed` fields
/// such as vacancy loss.
pub fn check_non_negative(record: &SuperSheetRecord, signed: &[String]) -> Vec<Diagnostic> {
    record
        .all_fields()
        .into_iter()
        .filter(|f| matches!(f.kind(), FieldKind::Currency | FieldKind::Area))
        .filter(|f| !signed.iter().any(|s| s == &f.name))
        .filter(|f| f.as_decimal().is_some_and(|v| v < Decimal::ZERO))
        .map(|f| {
            Diagnostic::new(
                format!("{}.{}", f.provenance.section, f.name),
                Issue::NegativeValue,
                format!("{} is negative ('{}')", f.name, f.raw),
            )
            .at(f.provenance)
        })
        .collect()
}

/// Fields that parsed but with confidence under `threshold`. Zero-confidence
/// fields already carry an unparseable-value diagnostic and are skipped.
pub fn sweep_low_confidence(record: &SuperSheetRecord, threshold: f64) -> Vec<Diagnostic> {
    record
        .all_fields()
        .into_iter()
        .filter(|f| f.confidence > 0.0 && f.confidence < threshold)
        .map(|f| {
            Diagnostic::new(
                format!("{}.{}", f.provenance.section, f.name),
                Issue::LowConfidence,
                format!("'{}' extracted with confidence {:.2}", f.raw, f.confidence),
            )
            .at(f.provenance)
        })
        .collect()
}
