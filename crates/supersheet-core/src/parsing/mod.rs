pub mod columns;
pub mod header;
pub mod normalize;
pub mod values;

use crate::config::schema::{ColumnDef, ExtractionConfig, LabeledFieldDef};
use crate::diagnostics::{Diagnostic, Issue};
use crate::model::{Region, SectionKind, Table};
use crate::record::{Field, Provenance, RentRollRow, UnitMixRow};
use columns::{find_header_row, ColumnMapping};
use header::extract_header_fields;
use normalize::{best_match, is_numeric_like, match_label, normalize_label, MatchStrength};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use values::{normalize_field, FieldOutcome};

/// Everything pulled out of the classified regions of one document, in
/// document order, before cross-field validation.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    pub header: Vec<Field>,
    pub unit_mix: Vec<UnitMixRow>,
    /// Unit counts printed on unit-mix totals rows.
    pub unit_mix_totals: Vec<Field>,
    pub rent_roll: Vec<RentRollRow>,
    pub financials: Vec<Field>,
    pub financial_unmatched: Vec<String>,
    pub comments: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractedFields {
    fn take(&mut self, outcome: FieldOutcome) -> Field {
        if let Some(d) = outcome.diagnostic {
            self.diagnostics.push(d);
        }
        outcome.field
    }
}

/// Run field extraction over every region.
///
/// `tables` holds the reconstructed table of each tabular region, matched by
/// page and region index. Unknown regions produce an `unclassified_region`
/// diagnostic and nothing else.
pub fn extract_fields(regions: &[Region], tables: &[Table], config: &ExtractionConfig) -> ExtractedFields {
    let mut out = ExtractedFields::default();
    let mut mappings: HashMap<SectionKind, ColumnMapping> = HashMap::new();

    for region in regions {
        let table = tables
            .iter()
            .find(|t| t.page == region.page && t.region == region.index && !t.rows.is_empty());

        match region.kind {
            SectionKind::Header => {
                for outcome in extract_header_fields(region, config) {
                    let field = out.take(outcome);
                    out.header.push(field);
                }
            }
            SectionKind::UnitMix | SectionKind::RentRoll => {
                let (Some(table), Some(defs)) = (table, config.tables.for_kind(region.kind)) else {
                    continue;
                };
                let rows = extract_rows(table, defs, &mut mappings, config, &mut out);
                if region.kind == SectionKind::UnitMix {
                    out.unit_mix.extend(rows.into_iter().map(unit_mix_row));
                } else {
                    out.rent_roll.extend(rows.into_iter().map(rent_roll_row));
                }
            }
            SectionKind::Financials => {
                if let Some(table) = table {
                    extract_financials(table, &config.financial_items, config, &mut out);
                }
            }
            SectionKind::Comments => {
                let text = region
                    .content_lines()
                    .iter()
                    .map(|l| l.text())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !text.is_empty() {
                    out.comments.push(text);
                }
            }
            SectionKind::Unknown => {
                let preview: String = region
                    .lines
                    .first()
                    .map(|l| l.text())
                    .unwrap_or_default()
                    .chars()
                    .take(60)
                    .collect();
                out.diagnostics.push(
                    Diagnostic::new(
                        region.label(),
                        Issue::UnclassifiedRegion,
                        format!("{} lines not recognized as a section: '{preview}'", region.lines.len()),
                    )
                    .at(Provenance {
                        page: region.page,
                        region: region.index,
                        section: SectionKind::Unknown,
                        row: None,
                        column: None,
                    }),
                );
            }
        }
    }

    debug!(
        header = out.header.len(),
        unit_mix = out.unit_mix.len(),
        rent_roll = out.rent_roll.len(),
        financials = out.financials.len(),
        diagnostics = out.diagnostics.len(),
        "fields extracted"
    );
    out
}

/// Extract the data rows of a unit-mix or rent-roll table as field maps.
///
/// The header row is located in the first rows of the table. A table without
/// one reuses the previous mapping for the same section when the column count
/// matches (a table continued from the previous page); otherwise columns are
/// mapped by position.
fn extract_rows(
    table: &Table,
    defs: &[ColumnDef],
    mappings: &mut HashMap<SectionKind, ColumnMapping>,
    config: &ExtractionConfig,
    out: &mut ExtractedFields,
) -> Vec<BTreeMap<String, Field>> {
    let width = table.columns.len();
    let provenance = |row: Option<usize>, column: Option<usize>| Provenance {
        page: table.page,
        region: table.region,
        section: table.kind,
        row,
        column,
    };

    let (start, mapping) = match find_header_row(&table.rows, defs) {
        Some((i, mapping)) => {
            mappings.insert(table.kind, mapping.clone());
            (i + 1, mapping)
        }
        None => match mappings.get(&table.kind) {
            Some(previous) if previous.width() == width => {
                debug!(page = table.page, region = table.region, kind = %table.kind, "continuing previous column mapping");
                (0, previous.clone())
            }
            _ => {
                out.diagnostics.push(
                    Diagnostic::new(
                        format!("{}.table", table.kind),
                        Issue::MissingHeaderRow,
                        format!(
                            "no column headers found in page {} region {}; columns mapped by position",
                            table.page, table.region
                        ),
                    )
                    .at(provenance(None, None)),
                );
                (0, ColumnMapping::positional(width, defs))
            }
        },
    };

    for (d, def) in defs.iter().enumerate() {
        if def.required && mapping.column_of(d).is_none() {
            out.diagnostics.push(
                Diagnostic::new(
                    format!("{}.{}", table.kind, def.field),
                    Issue::MissingColumn,
                    format!("required column '{}' not found", def.field),
                )
                .at(provenance(None, None)),
            );
        }
    }

    let mut rows = Vec::new();
    for (r, cells) in table.rows.iter().enumerate().skip(start) {
        if is_total_row(cells, &config.total_row_labels) {
            if table.kind == SectionKind::UnitMix {
                let count = defs
                    .iter()
                    .position(|d| d.field == "count")
                    .and_then(|d| mapping.column_of(d).map(|c| (d, c)));
                if let Some((d, c)) = count {
                    let def = &defs[d];
                    let total = cells.get(c).and_then(|cell| {
                        normalize_field(&def.field, def.kind, cell, MatchStrength::Exact, provenance(Some(r), Some(c)), config)
                    });
                    // An unreadable printed total cannot be reconciled; report it.
                    match total {
                        Some(FieldOutcome { diagnostic: Some(d), .. }) => out.diagnostics.push(d),
                        Some(outcome) => out.unit_mix_totals.push(outcome.field),
                        None => {}
                    }
                }
            }
            continue;
        }

        let mut fields = BTreeMap::new();
        for (c, assignment) in mapping.assignments.iter().enumerate() {
            let (Some((d, strength)), Some(cell)) = (assignment, cells.get(c)) else {
                continue;
            };
            let def = &defs[*d];
            if let Some(outcome) =
                normalize_field(&def.field, def.kind, cell, *strength, provenance(Some(r), Some(c)), config)
            {
                let field = out.take(outcome);
                fields.insert(def.field.clone(), field);
            }
        }
        if !fields.is_empty() {
            rows.push(fields);
        }
    }
    rows
}

fn is_total_row(cells: &[String], labels: &[String]) -> bool {
    let Some(first) = cells.iter().find(|c| !c.trim().is_empty()) else {
        return false;
    };
    labels
        .iter()
        .any(|l| match_label(first, l) == Some(MatchStrength::Exact))
}

/// Extract financial line items from a key/value table.
///
/// The label is the first non-empty cell. Its value is either the text after
/// a colon in that cell or the next non-empty cell; a single cell like
/// "NOI $250,000" is split at its first numeric token.
fn extract_financials(
    table: &Table,
    items: &[LabeledFieldDef],
    config: &ExtractionConfig,
    out: &mut ExtractedFields,
) {
    for (r, cells) in table.rows.iter().enumerate() {
        let Some(label_col) = cells.iter().position(|c| !c.trim().is_empty()) else {
            continue;
        };
        let first = cells[label_col].trim();
        if is_numeric_like(first) {
            continue;
        }

        let next_cell = || {
            cells
                .iter()
                .enumerate()
                .skip(label_col + 1)
                .find(|(_, c)| !c.trim().is_empty())
                .map(|(i, c)| (c.trim().to_string(), i))
        };
        let (label, value, value_col) = match first.split_once(':') {
            Some((label, rest)) if !rest.trim().is_empty() => {
                (label.trim().to_string(), rest.trim().to_string(), label_col)
            }
            Some((label, _)) => match next_cell() {
                Some((v, i)) => (label.trim().to_string(), v, i),
                None => (label.trim().to_string(), String::new(), label_col),
            },
            None => match next_cell() {
                Some((v, i)) => (first.to_string(), v, i),
                None => match split_trailing_value(first) {
                    Some((l, v)) => (l.to_string(), v.to_string(), label_col),
                    None => (first.to_string(), String::new(), label_col),
                },
            },
        };

        match match_item(&label, items) {
            Some((def, strength)) => {
                if value.is_empty() {
                    continue;
                }
                let provenance = Provenance {
                    page: table.page,
                    region: table.region,
                    section: table.kind,
                    row: Some(r),
                    column: Some(value_col),
                };
                if let Some(outcome) = normalize_field(&def.field, def.kind, &value, strength, provenance, config) {
                    let field = out.take(outcome);
                    out.financials.push(field);
                }
            }
            None if !value.is_empty() => out.financial_unmatched.push(format!("{label}: {value}")),
            None => {}
        }
    }
}

/// Best financial item for a row label. A label that starts with an item
/// phrase ("Net Operating Income (NOI)") counts as an abbreviated match.
fn match_item<'a>(label: &str, items: &'a [LabeledFieldDef]) -> Option<(&'a LabeledFieldDef, MatchStrength)> {
    let normalized = normalize_label(label);
    let mut best: Option<(&LabeledFieldDef, MatchStrength)> = None;
    for def in items {
        let strength = best_match(label, &def.labels).or_else(|| {
            def.labels
                .iter()
                .any(|l| normalized.starts_with(&format!("{} ", normalize_label(l))))
                .then_some(MatchStrength::Abbreviated)
        });
        if let Some(s) = strength {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((def, s));
            }
        }
    }
    best
}

/// Split "Net Operating Income $250,000" into label and value at the first
/// numeric-looking word.
fn split_trailing_value(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for word in text.split_inclusive(char::is_whitespace) {
        let token = word.trim();
        if offset > 0 && is_numeric_like(token) {
            return Some((text[..offset].trim(), text[offset..].trim()));
        }
        offset += word.len();
    }
    None
}

fn unit_mix_row(mut fields: BTreeMap<String, Field>) -> UnitMixRow {
    UnitMixRow {
        unit_type: fields.remove("unit_type"),
        count: fields.remove("count"),
        size: fields.remove("size"),
        rent: fields.remove("rent"),
        extra: fields,
    }
}

fn rent_roll_row(mut fields: BTreeMap<String, Field>) -> RentRollRow {
    RentRollRow {
        unit: fields.remove("unit"),
        unit_type: fields.remove("unit_type"),
        tenant: fields.remove("tenant"),
        size: fields.remove("size"),
        rent: fields.remove("rent"),
        lease_start: fields.remove("lease_start"),
        lease_end: fields.remove("lease_end"),
        status: fields.remove("status"),
        extra: fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;
    use crate::model::{BBox, Column};
    use rust_decimal_macros::dec;

    fn table(kind: SectionKind, region: usize, rows: &[&[&str]]) -> Table {
        let width = rows.first().map_or(0, |r| r.len());
        Table {
            kind,
            page: 1,
            region,
            columns: (0..width)
                .map(|i| Column {
                    x_start: i as f32 * 100.0,
                    x_end: (i + 1) as f32 * 100.0,
                })
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn region_for(kind: SectionKind, index: usize) -> Region {
        Region {
            page: 1,
            index,
            lines: Vec::new(),
            bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            kind,
            confidence: 0.9,
            rule: None,
            title_lines: 0,
        }
    }

    #[test]
    fn test_unit_mix_rows() {
        let config = default_config().unwrap();
        let t = table(
            SectionKind::UnitMix,
            0,
            &[
                &["Unit Type", "Units", "Sq Ft", "Rent"],
                &["1BR", "10", "650", "$1,200"],
                &["2BR", "5", "900", "$1,600"],
                &["Total", "15", "", ""],
            ],
        );
        let out = extract_fields(&[region_for(SectionKind::UnitMix, 0)], &[t], &config);
        assert_eq!(out.unit_mix.len(), 2);
        assert_eq!(out.unit_mix[0].unit_type_text(), Some("1BR"));
        assert_eq!(out.unit_mix[1].count_value(), Some(5));
        assert_eq!(out.unit_mix[1].rent_amount(), Some(dec!(1600)));
        assert_eq!(out.unit_mix_totals.len(), 1);
        assert_eq!(out.unit_mix_totals[0].as_integer(), Some(15));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_unreadable_totals_row_is_reported() {
        let config = default_config().unwrap();
        let t = table(
            SectionKind::UnitMix,
            0,
            &[
                &["Unit Type", "Units", "Sq Ft", "Rent"],
                &["1BR", "10", "650", "$1,200"],
                &["Total", "N/A", "", ""],
            ],
        );
        let out = extract_fields(&[region_for(SectionKind::UnitMix, 0)], &[t], &config);
        assert_eq!(out.unit_mix.len(), 1);
        assert!(out.unit_mix_totals.is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        let d = &out.diagnostics[0];
        assert_eq!(d.issue, Issue::UnparseableValue);
        assert_eq!(d.field, "unit_mix.count");
        assert_eq!(d.location.and_then(|l| l.row), Some(2));
    }

    #[test]
    fn test_continuation_reuses_mapping() {
        let config = default_config().unwrap();
        let first = table(
            SectionKind::RentRoll,
            0,
            &[&["Unit", "Tenant", "Rent"], &["101", "Smith", "$1,100"]],
        );
        let second = table(SectionKind::RentRoll, 1, &[&["102", "Jones", "$1,150"]]);
        let regions = [region_for(SectionKind::RentRoll, 0), region_for(SectionKind::RentRoll, 1)];
        let out = extract_fields(&regions, &[first, second], &config);
        assert_eq!(out.rent_roll.len(), 2);
        assert_eq!(out.rent_roll[1].unit_text(), Some("102"));
        assert_eq!(out.rent_roll[1].rent_amount(), Some(dec!(1150)));
        assert_eq!(out.rent_roll[1].rent.as_ref().unwrap().confidence, 1.0);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_headerless_table_maps_by_position() {
        let config = default_config().unwrap();
        let t = table(SectionKind::UnitMix, 0, &[&["1BR", "10", "650", "$1,200"]]);
        let out = extract_fields(&[region_for(SectionKind::UnitMix, 0)], &[t], &config);
        assert_eq!(out.unit_mix.len(), 1);
        assert_eq!(out.unit_mix[0].count.as_ref().unwrap().confidence, 0.5);
        assert!(out.diagnostics.iter().any(|d| d.issue == Issue::MissingHeaderRow));
    }

    #[test]
    fn test_missing_required_column() {
        let config = default_config().unwrap();
        let t = table(
            SectionKind::UnitMix,
            0,
            &[&["Unit Type", "Rent"], &["1BR", "$1,200"]],
        );
        let out = extract_fields(&[region_for(SectionKind::UnitMix, 0)], &[t], &config);
        let missing: Vec<&Diagnostic> = out
            .diagnostics
            .iter()
            .filter(|d| d.issue == Issue::MissingColumn)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, "unit_mix.count");
        assert_eq!(out.unit_mix.len(), 1);
    }

    #[test]
    fn test_financial_rows() {
        let config = default_config().unwrap();
        let t = table(
            SectionKind::Financials,
            0,
            &[
                &["Gross Potential Rent", "$300,000"],
                &["Vacancy", "($15,000)"],
                &["Net Operating Income (NOI)", "$180,000"],
                &["Cap Rate: 6.5%", ""],
                &["Reserves", "$5,000"],
                &["Expenses", ""],
            ],
        );
        let out = extract_fields(&[region_for(SectionKind::Financials, 0)], &[t], &config);
        let get = |name: &str| out.financials.iter().find(|f| f.name == name).unwrap();
        assert_eq!(get("gross_potential_rent").as_decimal(), Some(dec!(300000)));
        assert_eq!(get("vacancy").as_decimal(), Some(dec!(-15000)));
        assert_eq!(get("net_operating_income").confidence, 0.7);
        assert_eq!(get("cap_rate").as_decimal(), Some(dec!(0.065)));
        assert_eq!(out.financial_unmatched, vec!["Reserves: $5,000".to_string()]);
        assert_eq!(out.financials.len(), 4);
    }

    #[test]
    fn test_split_trailing_value() {
        assert_eq!(split_trailing_value("NOI $250,000"), Some(("NOI", "$250,000")));
        assert_eq!(split_trailing_value("No numbers here"), None);
        assert_eq!(split_trailing_value("2024 Budget"), None);
    }

    #[test]
    fn test_unknown_region_is_reported() {
        let config = default_config().unwrap();
        let out = extract_fields(&[region_for(SectionKind::Unknown, 4)], &[], &config);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].issue, Issue::UnclassifiedRegion);
        assert_eq!(out.diagnostics[0].field, "page 1 region 4");
    }
}
