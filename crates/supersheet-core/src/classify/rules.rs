use crate::config::schema::{ExtractionConfig, RuleTier};
use crate::layout::{cluster_1d, Block};
use crate::model::{Line, Region, SectionKind};
use crate::parsing::header::count_labels;
use crate::parsing::normalize::{best_match, contains_phrase, is_numeric_like, match_label, MatchStrength};

/// What one rule thinks a block is.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: SectionKind,
    pub confidence: f64,
    pub tier: RuleTier,
    pub rule: &'static str,
    /// Leading lines the rule identified as a section title.
    pub title_lines: usize,
}

/// Document context available to the rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Zero-based position of the block's page among the document's pages.
    pub page_index: usize,
    /// The region classified immediately before this block, possibly on an
    /// earlier page.
    pub previous: Option<&'a Region>,
    pub config: &'a ExtractionConfig,
}

pub type Rule = fn(&Block, &RuleContext) -> Option<Candidate>;

/// Every rule, in no particular order; tier precedence decides between them.
pub const RULES: &[Rule] = &[
    anchor_title,
    header_labels,
    leading_block,
    follows_title,
    continues_table,
    column_headers,
    aligned_numeric,
    prose_block,
];

const TITLE_SEARCH_LINES: usize = 2;

fn candidate(kind: SectionKind, confidence: f64, tier: RuleTier, rule: &'static str) -> Candidate {
    Candidate {
        kind,
        confidence,
        tier,
        rule,
        title_lines: 0,
    }
}

/// A known section title in the first lines of the block ("Unit Mix",
/// "RENT ROLL", "Financial Summary:").
pub fn anchor_title(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for (i, line) in block.lines.iter().take(TITLE_SEARCH_LINES).enumerate() {
        let text = line.text();
        let words = text.split_whitespace().count();
        for (kind, anchors) in &ctx.config.classifier.anchors {
            for anchor in anchors {
                let confidence = if match_label(&text, anchor) == Some(MatchStrength::Exact) {
                    0.95
                } else if words <= anchor.split_whitespace().count() + 3 && contains_phrase(&text, anchor) {
                    0.8
                } else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| confidence > b.confidence) {
                    best = Some(Candidate {
                        title_lines: i + 1,
                        ..candidate(*kind, confidence, RuleTier::Keyword, "anchor_title")
                    });
                }
            }
        }
    }
    best
}

/// Two or more "Label: value" header fields.
pub fn header_labels(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    (count_labels(&block.lines, &ctx.config.header_fields) >= 2)
        .then(|| candidate(SectionKind::Header, 0.75, RuleTier::Keyword, "header_labels"))
}

/// The first block of the document is usually the property header; one
/// labelled field is enough to take it as such.
pub fn leading_block(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    (ctx.page_index == 0
        && block.index == 0
        && count_labels(&block.lines, &ctx.config.header_fields) >= 1)
        .then(|| candidate(SectionKind::Header, 0.6, RuleTier::Positional, "leading_block"))
}

/// A block right after a title-only region belongs to that title's section.
pub fn follows_title(_block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    let prev = ctx.previous?;
    let title_only = prev.kind != SectionKind::Unknown && prev.title_lines >= prev.lines.len();
    title_only.then(|| candidate(prev.kind, 0.7, RuleTier::Positional, "follows_title"))
}

/// A tabular block right after a table of some kind continues that table,
/// including across a page break.
pub fn continues_table(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    let prev = ctx.previous?;
    (prev.kind.is_tabular() && looks_tabular(&block.lines, ctx.config.thresholds.min_table_lines))
        .then(|| candidate(prev.kind, 0.5, RuleTier::Positional, "continues_table"))
}

/// A line of recognizable column headers near the top of the block.
pub fn column_headers(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    let mut best: Option<(SectionKind, usize)> = None;
    for line in block.lines.iter().take(TITLE_SEARCH_LINES) {
        for kind in [SectionKind::UnitMix, SectionKind::RentRoll] {
            let Some(defs) = ctx.config.tables.for_kind(kind) else {
                continue;
            };
            let hits = line
                .fragments
                .iter()
                .filter(|f| defs.iter().any(|d| best_match(&f.text, &d.synonyms).is_some()))
                .count();
            if hits >= 2 && best.map_or(true, |(_, h)| hits > h) {
                best = Some((kind, hits));
            }
        }
    }
    best.map(|(kind, hits)| {
        let confidence = (0.4 + 0.05 * hits as f64).min(0.65);
        candidate(kind, confidence, RuleTier::Structural, "column_headers")
    })
}

/// Numeric rows whose cells line up in at least two columns, with no header
/// to say what they are. A first column of numbers ("101", "102") reads as
/// unit numbers, so a rent roll; anything else ("1BR", "Studio") as a unit mix.
pub fn aligned_numeric(block: &Block, ctx: &RuleContext) -> Option<Candidate> {
    let lines = &block.lines;
    if !looks_tabular(lines, ctx.config.thresholds.min_table_lines) {
        return None;
    }

    let mut starts = Vec::new();
    let mut owners = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for f in &line.fragments {
            starts.push(f.bbox.x0);
            owners.push(i);
        }
    }
    let shared = cluster_1d(&starts, ctx.config.thresholds.column_tolerance)
        .iter()
        .filter(|c| {
            let mut rows: Vec<usize> = c.members.iter().map(|&m| owners[m]).collect();
            rows.sort_unstable();
            rows.dedup();
            rows.len() >= 2 && rows.len() * 2 >= lines.len()
        })
        .count();
    if shared < 2 {
        return None;
    }

    let numbered = lines
        .iter()
        .filter_map(|l| l.fragments.first())
        .filter(|f| is_numeric_like(&f.text))
        .count();
    let kind = if numbered * 2 > lines.len() {
        SectionKind::RentRoll
    } else {
        SectionKind::UnitMix
    };
    Some(candidate(kind, 0.35, RuleTier::Structural, "aligned_numeric"))
}

/// Runs of long single-fragment lines read as free text.
pub fn prose_block(block: &Block, _ctx: &RuleContext) -> Option<Candidate> {
    const MIN_WORDS_PER_LINE: usize = 8;

    if block.lines.is_empty() {
        return None;
    }
    let texts: Vec<String> = block.lines.iter().map(Line::text).collect();
    let words: usize = texts.iter().map(|t| t.split_whitespace().count()).sum();
    let single = block.lines.iter().filter(|l| l.fragments.len() == 1).count();
    let numeric = texts.iter().filter(|t| is_numeric_like(t)).count();

    let prose = words >= MIN_WORDS_PER_LINE * block.lines.len()
        && single * 2 >= block.lines.len()
        && numeric == 0;
    prose.then(|| candidate(SectionKind::Comments, 0.3, RuleTier::Structural, "prose_block"))
}

/// Enough multi-cell lines with enough numbers to be a table body.
pub fn looks_tabular(lines: &[Line], min_lines: usize) -> bool {
    if lines.len() < min_lines.max(1) {
        return false;
    }
    let multi = lines.iter().filter(|l| l.fragments.len() > 1).count();
    let total: usize = lines.iter().map(|l| l.fragments.len()).sum();
    let numeric = lines
        .iter()
        .flat_map(|l| l.fragments.iter())
        .filter(|f| is_numeric_like(&f.text))
        .count();
    multi * 2 >= lines.len() && total > 0 && numeric as f64 / total as f64 >= 0.3
}
