pub mod rules;

use crate::config::schema::{ExtractionConfig, RuleTier};
use crate::layout::Block;
use crate::model::{Region, SectionKind};
use rules::{Candidate, RuleContext, RULES};
use tracing::debug;

/// The classifier's verdict for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: SectionKind,
    pub confidence: f64,
    pub rule: &'static str,
    pub title_lines: usize,
}

/// Classify every block of a document, page by page and top to bottom.
///
/// Blocks are classified in order because positional rules look at the
/// region just before them. Blocks no rule claims become `unknown` regions.
pub fn classify_document(pages: Vec<Vec<Block>>, config: &ExtractionConfig) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();
    for (page_index, blocks) in pages.into_iter().enumerate() {
        for block in blocks {
            let ctx = RuleContext {
                page_index,
                previous: regions.last(),
                config,
            };
            let region = classify_block(block, &ctx);
            regions.push(region);
        }
    }
    regions
}

/// Run every rule against a block and turn it into a region.
pub fn classify_block(block: Block, ctx: &RuleContext) -> Region {
    let candidates: Vec<Candidate> = RULES.iter().filter_map(|rule| rule(&block, ctx)).collect();
    let decision = decide(&candidates, &ctx.config.classifier.precedence);

    match &decision {
        Some(d) => debug!(
            page = block.page,
            index = block.index,
            kind = %d.kind,
            confidence = d.confidence,
            rule = d.rule,
            "region classified"
        ),
        None => debug!(page = block.page, index = block.index, "region unclassified"),
    }

    let (kind, confidence, rule, title_lines) = match decision {
        Some(d) => (d.kind, d.confidence, Some(d.rule.to_string()), d.title_lines),
        None => (SectionKind::Unknown, 0.0, None, 0),
    };
    Region {
        page: block.page,
        index: block.index,
        lines: block.lines,
        bbox: block.bbox,
        kind,
        confidence,
        rule,
        title_lines,
    }
}

/// Pick a section kind from rule candidates.
///
/// The first tier in `precedence` that produced any candidate decides the
/// kind, taking its most confident candidate (earliest rule on a tie). The
/// confidence is the highest score among candidates of every tier that agree
/// with that kind, and so is the title line count.
pub fn decide(candidates: &[Candidate], precedence: &[RuleTier]) -> Option<Decision> {
    let winner = precedence.iter().find_map(|tier| {
        candidates
            .iter()
            .filter(|c| c.tier == *tier)
            .fold(None, |best: Option<&Candidate>, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            })
    })?;

    let agreeing = candidates.iter().filter(|c| c.kind == winner.kind);
    let (confidence, title_lines) = agreeing.fold((0.0_f64, 0), |(conf, titles), c| {
        (conf.max(c.confidence), titles.max(c.title_lines))
    });

    Some(Decision {
        kind: winner.kind,
        confidence,
        rule: winner.rule,
        title_lines,
    })
}
