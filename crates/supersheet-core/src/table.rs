use crate::config::Thresholds;
use crate::diagnostics::{Diagnostic, Issue};
use crate::layout::cluster_1d;
use crate::model::{Column, Fragment, Region, Table};
use crate::record::Provenance;

/// A reconstructed table plus any layout problems noticed while building it.
#[derive(Debug, Clone)]
pub struct TableBuild {
    pub table: Table,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rebuild the rows and columns of a tabular region.
///
/// Column starts come from clustering the left edges of every fragment in the
/// region. Each fragment goes to the column whose start is nearest its own left
/// edge; fragments sharing a cell are joined with a space. Every row has one
/// cell per column, and rows with no text at all are dropped.
pub fn reconstruct(region: &Region, thresholds: &Thresholds) -> TableBuild {
    let lines = region.content_lines();
    let fragments: Vec<&Fragment> = lines
        .iter()
        .flat_map(|l| l.fragments.iter())
        .filter(|f| !f.text.trim().is_empty())
        .collect();

    let columns = infer_columns(&fragments, thresholds.column_tolerance);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut diagnostics = Vec::new();

    for line in lines {
        let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
        let mut merged: Vec<(usize, &Fragment)> = Vec::new();

        for frag in line.fragments.iter().filter(|f| !f.text.trim().is_empty()) {
            let Some(col) = nearest_column(&columns, frag.bbox.x0) else {
                continue;
            };
            cells[col].push(frag.text.trim());
            if let Some(next) = columns.get(col + 1) {
                if frag.bbox.x1 > next.x_start + thresholds.merged_cell_slack {
                    merged.push((col, frag));
                }
            }
        }

        if cells.iter().all(Vec::is_empty) {
            continue;
        }
        let row_index = rows.len();
        for (col, frag) in merged {
            diagnostics.push(
                Diagnostic::new(
                    format!("{}.table", region.kind),
                    Issue::PossibleMergedCell,
                    format!(
                        "'{}' in {} row {} runs into column {}; kept in column {}",
                        frag.text.trim(),
                        region.label(),
                        row_index,
                        col + 1,
                        col
                    ),
                )
                .at(Provenance {
                    page: region.page,
                    region: region.index,
                    section: region.kind,
                    row: Some(row_index),
                    column: Some(col),
                }),
            );
        }
        rows.push(cells.into_iter().map(|c| c.join(" ")).collect());
    }

    TableBuild {
        table: Table {
            kind: region.kind,
            page: region.page,
            region: region.index,
            columns,
            rows,
        },
        diagnostics,
    }
}

/// Column boundaries from the left edges of the fragments.
///
/// A column spans from its cluster's leftmost start to the next column's
/// start; the last column extends to the rightmost fragment edge.
pub fn infer_columns(fragments: &[&Fragment], tolerance: f32) -> Vec<Column> {
    if fragments.is_empty() {
        return Vec::new();
    }
    let starts: Vec<f32> = fragments.iter().map(|f| f.bbox.x0).collect();
    let right = fragments.iter().map(|f| f.bbox.x1).fold(f32::MIN, f32::max);
    let clusters = cluster_1d(&starts, tolerance);

    clusters
        .iter()
        .enumerate()
        .map(|(i, c)| Column {
            x_start: c.min,
            x_end: clusters.get(i + 1).map_or(right.max(c.max), |n| n.min),
        })
        .collect()
}

fn nearest_column(columns: &[Column], x: f32) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x_start - x).abs().total_cmp(&(b.x_start - x).abs()))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;
    use crate::model::{BBox, Line, SectionKind};

    fn frag(text: &str, x: f32, width: f32) -> Fragment {
        Fragment::new(text, BBox::new(x, 0.0, x + width, 10.0), 10.0)
    }

    fn line(y: f32, frags: Vec<Fragment>) -> Line {
        let frags: Vec<Fragment> = frags
            .into_iter()
            .map(|mut f| {
                f.bbox.y0 = y;
                f.bbox.y1 = y + 10.0;
                f
            })
            .collect();
        Line {
            page: 1,
            bbox: BBox::new(0.0, y, 500.0, y + 10.0),
            fragments: frags,
        }
    }

    fn region(lines: Vec<Line>) -> Region {
        Region {
            page: 1,
            index: 3,
            bbox: BBox::new(0.0, 0.0, 500.0, 200.0),
            lines,
            kind: SectionKind::UnitMix,
            confidence: 0.9,
            rule: None,
            title_lines: 0,
        }
    }

    fn thresholds() -> Thresholds {
        default_config().unwrap().thresholds
    }

    #[test]
    fn test_rows_follow_lines_and_columns_follow_starts() {
        let r = region(vec![
            line(0.0, vec![frag("Unit Type", 50.0, 50.0), frag("Units", 150.0, 30.0), frag("Rent", 250.0, 30.0)]),
            line(14.0, vec![frag("1BR", 52.0, 20.0), frag("10", 153.0, 12.0), frag("$1200", 248.0, 30.0)]),
            line(28.0, vec![frag("2BR", 51.0, 20.0), frag("5", 155.0, 6.0), frag("$1600", 250.0, 30.0)]),
        ]);
        let build = reconstruct(&r, &thresholds());
        assert_eq!(build.table.columns.len(), 3);
        assert_eq!(build.table.rows[0], vec!["Unit Type", "Units", "Rent"]);
        assert_eq!(build.table.rows[2], vec!["2BR", "5", "$1600"]);
        assert!(build.diagnostics.is_empty());
    }

    #[test]
    fn test_sparse_line_keeps_every_column() {
        let r = region(vec![
            line(0.0, vec![frag("A", 50.0, 10.0), frag("B", 150.0, 10.0), frag("C", 250.0, 10.0)]),
            line(14.0, vec![frag("only", 250.0, 20.0)]),
        ]);
        let build = reconstruct(&r, &thresholds());
        for row in &build.table.rows {
            assert_eq!(row.len(), build.table.columns.len());
        }
        assert_eq!(build.table.rows[1], vec!["", "", "only"]);
    }

    #[test]
    fn test_same_column_fragments_are_joined() {
        let r = region(vec![
            line(0.0, vec![frag("Jane", 50.0, 20.0), frag("Doe", 56.0, 20.0), frag("X", 200.0, 10.0)]),
            line(14.0, vec![frag("Bob", 50.0, 20.0), frag("Y", 200.0, 10.0)]),
        ]);
        let build = reconstruct(&r, &thresholds());
        assert_eq!(build.table.rows[0], vec!["Jane Doe", "X"]);
    }

    #[test]
    fn test_title_lines_are_skipped_and_blank_rows_dropped() {
        let mut r = region(vec![
            line(0.0, vec![frag("Unit Mix", 50.0, 60.0)]),
            line(14.0, vec![frag("A", 50.0, 10.0), frag("B", 150.0, 10.0)]),
            line(28.0, vec![frag("   ", 50.0, 10.0)]),
            line(42.0, vec![frag("C", 50.0, 10.0), frag("D", 150.0, 10.0)]),
        ]);
        r.title_lines = 1;
        let build = reconstruct(&r, &thresholds());
        assert_eq!(build.table.rows.len(), 2);
        assert_eq!(build.table.rows[1], vec!["C", "D"]);
    }

    #[test]
    fn test_spanning_fragment_flags_merged_cell() {
        let r = region(vec![
            line(0.0, vec![frag("Type", 50.0, 30.0), frag("Units", 150.0, 30.0)]),
            line(14.0, vec![frag("Two Bedroom Townhome Deluxe", 50.0, 160.0)]),
            line(28.0, vec![frag("1BR", 50.0, 20.0), frag("4", 150.0, 6.0)]),
        ]);
        let build = reconstruct(&r, &thresholds());
        assert_eq!(build.table.rows[1], vec!["Two Bedroom Townhome Deluxe", ""]);
        assert_eq!(build.diagnostics.len(), 1);
        let d = &build.diagnostics[0];
        assert_eq!(d.issue, Issue::PossibleMergedCell);
        assert_eq!(d.field, "unit_mix.table");
        assert_eq!(d.location.unwrap().row, Some(1));
    }

    #[test]
    fn test_empty_region_has_no_columns() {
        let build = reconstruct(&region(vec![]), &thresholds());
        assert!(build.table.columns.is_empty());
        assert!(build.table.rows.is_empty());
    }
}
