use crate::config::schema::{ExtractionConfig, LabeledFieldDef};
use crate::model::{Line, Region};
use crate::parsing::normalize::{best_match, normalize_whitespace, MatchStrength};
use crate::parsing::values::{normalize_field, FieldOutcome};
use crate::record::Provenance;

/// A label found at the start of a fragment.
#[derive(Debug, Clone)]
pub struct LabelHit<'a> {
    pub def: &'a LabeledFieldDef,
    pub strength: MatchStrength,
    /// Text after the label in the same fragment (may be empty).
    pub value: String,
}

/// Recognize "Label: value" or a bare "Label" in one fragment.
///
/// With a colon, the part before it may match exactly or as an abbreviation.
/// Without one, the whole fragment must equal a label exactly, so ordinary
/// values are not mistaken for labels.
pub fn find_label<'a>(text: &str, defs: &'a [LabeledFieldDef]) -> Option<LabelHit<'a>> {
    let text = text.trim();
    let (label_part, value, allow_abbrev) = match text.split_once(':') {
        Some((label, rest)) => (label, rest.trim(), true),
        None => (text, "", false),
    };
    if label_part.trim().is_empty() {
        return None;
    }

    let mut best: Option<(&LabeledFieldDef, MatchStrength)> = None;
    for def in defs {
        let Some(strength) = best_match(label_part, &def.labels) else {
            continue;
        };
        if strength == MatchStrength::Abbreviated && !allow_abbrev {
            continue;
        }
        if best.map_or(true, |(_, s)| strength > s) {
            best = Some((def, strength));
        }
    }

    best.map(|(def, strength)| LabelHit {
        def,
        strength,
        value: normalize_whitespace(value),
    })
}

/// Number of distinct header fields written as "Label: value" in these lines.
///
/// Bare labels are not counted; a table row reading "Occupancy" is not
/// evidence of a header block.
pub fn count_labels(lines: &[Line], defs: &[LabeledFieldDef]) -> usize {
    let mut found: Vec<&str> = Vec::new();
    for line in lines {
        for frag in line.fragments.iter().filter(|f| f.text.contains(':')) {
            if let Some(hit) = find_label(&frag.text, defs) {
                if !found.contains(&hit.def.field.as_str()) {
                    found.push(&hit.def.field);
                }
            }
        }
    }
    found.len()
}

/// Extract key/value header fields from a region.
///
/// The value of a label is the rest of its fragment plus the following
/// fragments up to the next label on the same line. When that is empty, the
/// next line supplies the value, provided it carries no labels of its own.
pub fn extract_header_fields(region: &Region, config: &ExtractionConfig) -> Vec<FieldOutcome> {
    let defs = &config.header_fields;
    let lines = region.content_lines();
    let mut out = Vec::new();

    for (li, line) in lines.iter().enumerate() {
        let hits: Vec<(usize, LabelHit)> = line
            .fragments
            .iter()
            .enumerate()
            .filter_map(|(fi, f)| find_label(&f.text, defs).map(|h| (fi, h)))
            .collect();

        for (k, (fi, hit)) in hits.iter().enumerate() {
            let next_label = hits.get(k + 1).map_or(line.fragments.len(), |(n, _)| *n);
            let mut parts: Vec<&str> = Vec::new();
            if !hit.value.is_empty() {
                parts.push(&hit.value);
            }
            parts.extend(
                line.fragments[fi + 1..next_label]
                    .iter()
                    .map(|f| f.text.trim())
                    .filter(|t| !t.is_empty()),
            );
            let mut value = parts.join(" ");
            let mut row = li;

            if value.is_empty() {
                if let Some(next) = lines.get(li + 1) {
                    let labelled = next.fragments.iter().any(|f| find_label(&f.text, defs).is_some());
                    if !labelled {
                        value = next.text();
                        row = li + 1;
                    }
                }
            }

            let provenance = Provenance {
                page: region.page,
                region: region.index,
                section: region.kind,
                row: Some(row),
                column: Some(*fi),
            };
            if let Some(outcome) = normalize_field(
                &hit.def.field,
                hit.def.kind,
                &value,
                hit.strength,
                provenance,
                config,
            ) {
                out.push(outcome);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;
    use crate::model::{BBox, Fragment, SectionKind};
    use crate::record::FieldValue;

    fn line(y: f32, parts: &[(&str, f32)]) -> Line {
        let fragments: Vec<Fragment> = parts
            .iter()
            .map(|(t, x)| Fragment::new(*t, BBox::new(*x, y, x + 80.0, y + 10.0), 10.0))
            .collect();
        Line {
            page: 1,
            bbox: BBox::new(0.0, y, 600.0, y + 10.0),
            fragments,
        }
    }

    fn region(lines: Vec<Line>) -> Region {
        Region {
            page: 1,
            index: 0,
            bbox: BBox::new(0.0, 0.0, 600.0, 200.0),
            lines,
            kind: SectionKind::Header,
            confidence: 0.75,
            rule: None,
            title_lines: 0,
        }
    }

    #[test]
    fn test_find_label_with_colon() {
        let config = default_config().unwrap();
        let hit = find_label("Total Units: 15", &config.header_fields).unwrap();
        assert_eq!(hit.def.field, "total_units");
        assert_eq!(hit.strength, MatchStrength::Exact);
        assert_eq!(hit.value, "15");
    }

    #[test]
    fn test_find_label_abbreviated() {
        let config = default_config().unwrap();
        let hit = find_label("Bldg Size: 12,000 SF", &config.header_fields).unwrap();
        assert_eq!(hit.def.field, "building_size");
        assert_eq!(hit.strength, MatchStrength::Abbreviated);
    }

    #[test]
    fn test_bare_value_is_not_a_label() {
        let config = default_config().unwrap();
        assert!(find_label("Sunset Apartments", &config.header_fields).is_none());
        assert!(find_label("Bldg Size", &config.header_fields).is_none());
    }

    #[test]
    fn test_count_labels_needs_colons() {
        let config = default_config().unwrap();
        let lines = vec![
            line(100.0, &[("Occupancy", 50.0), ("95%", 150.0)]),
            line(114.0, &[("Cap Rate", 50.0), ("6.5%", 150.0)]),
        ];
        assert_eq!(count_labels(&lines, &config.header_fields), 0);
        let lines = vec![
            line(100.0, &[("Year Built: 1998", 50.0)]),
            line(114.0, &[("Units: 15", 50.0), ("Yr Built: 1998", 200.0)]),
        ];
        assert_eq!(count_labels(&lines, &config.header_fields), 2);
    }

    #[test]
    fn test_two_labels_on_one_line() {
        let config = default_config().unwrap();
        let r = region(vec![line(
            100.0,
            &[("Property Name: Sunset Apartments", 50.0), ("Total Units: 15", 320.0)],
        )]);
        let fields = extract_header_fields(&r, &config);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field.as_text(), Some("Sunset Apartments"));
        assert_eq!(fields[1].field.as_integer(), Some(15));
    }

    #[test]
    fn test_value_in_following_fragment() {
        let config = default_config().unwrap();
        let r = region(vec![line(100.0, &[("Address", 50.0), ("123 Main St", 150.0)])]);
        let fields = extract_header_fields(&r, &config);
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0].field.value,
            FieldValue::Address {
                text: "123 Main St".into()
            }
        );
    }

    #[test]
    fn test_value_on_next_line() {
        let config = default_config().unwrap();
        let r = region(vec![
            line(100.0, &[("Address:", 50.0)]),
            line(114.0, &[("123 Main St", 50.0)]),
        ]);
        let fields = extract_header_fields(&r, &config);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field.as_text(), Some("123 Main St"));
        assert_eq!(fields[0].field.provenance.row, Some(1));
    }
}
