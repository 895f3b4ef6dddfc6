use crate::config::schema::ColumnDef;
use crate::parsing::normalize::{best_match, MatchStrength};

/// Which configured column, if any, each table column holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    /// Per table column: index into the column definitions and how it matched.
    pub assignments: Vec<Option<(usize, MatchStrength)>>,
}

impl ColumnMapping {
    /// Map columns to definitions in order, for tables without a header row.
    pub fn positional(width: usize, defs: &[ColumnDef]) -> Self {
        ColumnMapping {
            assignments: (0..width)
                .map(|i| (i < defs.len()).then_some((i, MatchStrength::Positional)))
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.assignments.len()
    }

    pub fn matched(&self) -> usize {
        self.assignments.iter().flatten().count()
    }

    pub fn column_of(&self, def: usize) -> Option<usize> {
        self.assignments
            .iter()
            .position(|a| matches!(a, Some((d, _)) if *d == def))
    }
}

/// Match a row of header cells against the column dictionary.
///
/// Exact matches are assigned before abbreviated ones, then left to right; a
/// definition is used at most once.
pub fn map_header_row(cells: &[String], defs: &[ColumnDef]) -> ColumnMapping {
    let mut candidates: Vec<(MatchStrength, usize, usize)> = Vec::new();
    for (col, cell) in cells.iter().enumerate() {
        for (d, def) in defs.iter().enumerate() {
            if let Some(strength) = best_match(cell, &def.synonyms) {
                candidates.push((strength, col, d));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut assignments: Vec<Option<(usize, MatchStrength)>> = vec![None; cells.len()];
    let mut used = vec![false; defs.len()];
    for (strength, col, d) in candidates {
        if assignments[col].is_none() && !used[d] {
            assignments[col] = Some((d, strength));
            used[d] = true;
        }
    }
    ColumnMapping { assignments }
}

/// Find the column-header row among the first few rows of a table.
///
/// A row qualifies when at least two of its cells name known columns, or when
/// every non-empty cell does. The row with the most matches wins.
pub fn find_header_row(rows: &[Vec<String>], defs: &[ColumnDef]) -> Option<(usize, ColumnMapping)> {
    const SEARCH_ROWS: usize = 3;

    let mut best: Option<(usize, ColumnMapping)> = None;
    for (i, row) in rows.iter().take(SEARCH_ROWS).enumerate() {
        let mapping = map_header_row(row, defs);
        let matched = mapping.matched();
        let filled = row.iter().filter(|c| !c.trim().is_empty()).count();
        let qualifies = matched >= 2 || (matched >= 1 && matched == filled);
        if qualifies && best.as_ref().map_or(true, |(_, m)| matched > m.matched()) {
            best = Some((i, mapping));
        }
    }
    best
}
