use crate::config::Thresholds;
use crate::layout::cluster::{cluster_1d, median};
use crate::model::{BBox, Fragment, Line};

/// An unclassified run of lines separated from its neighbours by a vertical
/// gap or a heading.
#[derive(Debug, Clone)]
pub struct Block {
    pub page: usize,
    pub index: usize,
    pub lines: Vec<Line>,
    pub bbox: BBox,
}

/// Segment one page of fragments into top-to-bottom blocks.
///
/// Every fragment ends up in exactly one line and every line in exactly one
/// block. An empty page yields no blocks.
pub fn segment_page(page: usize, fragments: &[Fragment], thresholds: &Thresholds) -> Vec<Block> {
    let median_font = median(fragments.iter().map(|f| f.font_size)).unwrap_or(0.0);
    let lines = group_lines(page, fragments, thresholds);
    group_blocks(page, lines, median_font, thresholds)
}

/// Cluster fragments into lines by vertical center.
pub fn group_lines(page: usize, fragments: &[Fragment], thresholds: &Thresholds) -> Vec<Line> {
    if fragments.is_empty() {
        return Vec::new();
    }

    let median_height = median(fragments.iter().map(Fragment::effective_height)).unwrap_or(0.0);
    let tolerance = (median_height * thresholds.line_cluster_ratio).max(f32::EPSILON);
    let centers: Vec<f32> = fragments.iter().map(Fragment::center_y).collect();

    cluster_1d(&centers, tolerance)
        .into_iter()
        .map(|cluster| {
            let mut members: Vec<Fragment> = cluster
                .members
                .iter()
                .map(|&i| {
                    let mut f = fragments[i].clone();
                    f.bbox = f.bbox.clamped();
                    f
                })
                .collect();
            members.sort_by(|a, b| {
                a.bbox
                    .x0
                    .total_cmp(&b.bbox.x0)
                    .then(a.bbox.y0.total_cmp(&b.bbox.y0))
            });
            let bbox = members
                .iter()
                .skip(1)
                .fold(members[0].bbox, |acc, f| acc.union(&f.bbox));
            Line {
                page,
                fragments: members,
                bbox,
            }
        })
        .collect()
}

/// Split ordered lines into blocks at large vertical gaps and at headings.
///
/// Gaps are measured from the lowest edge reached so far in the current
/// block, so a tall line keeps later lines it reaches down to. Blocks that
/// still overlap vertically are merged; blocks on a page never overlap.
fn group_blocks(
    page: usize,
    lines: Vec<Line>,
    median_font: f32,
    thresholds: &Thresholds,
) -> Vec<Block> {
    let median_line_height = median(lines.iter().map(|l| l.bbox.height())).unwrap_or(0.0);
    let gap_threshold = median_line_height * thresholds.region_gap_ratio;

    let mut groups: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    let mut bottom = f32::NEG_INFINITY;
    let mut prev_heading = false;

    for line in lines {
        let heading = is_heading(&line, median_font, thresholds.heading_size_ratio);
        if !current.is_empty() {
            let gap = line.bbox.y0 - bottom;
            let breaks = gap > gap_threshold || (heading && !prev_heading && gap >= 0.0);
            if breaks {
                groups.push(std::mem::take(&mut current));
                bottom = f32::NEG_INFINITY;
            }
        }
        prev_heading = heading;
        bottom = bottom.max(line.bbox.y1);
        current.push(line);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    let mut merged: Vec<(BBox, Vec<Line>)> = Vec::new();
    for group in groups {
        let mut bbox = span(&group);
        let mut lines = group;
        while let Some((top_bbox, _)) = merged.last() {
            if bbox.y0 >= top_bbox.y1 {
                break;
            }
            let Some((top_bbox, mut top_lines)) = merged.pop() else {
                break;
            };
            top_lines.append(&mut lines);
            lines = top_lines;
            bbox = top_bbox.union(&bbox);
        }
        merged.push((bbox, lines));
    }

    merged
        .into_iter()
        .enumerate()
        .map(|(index, (bbox, lines))| Block {
            page,
            index,
            lines,
            bbox,
        })
        .collect()
}

/// Heading-sized text, or a lone bold fragment set apart from body text.
fn is_heading(line: &Line, median_font: f32, ratio: f32) -> bool {
    if median_font > 0.0 && line.max_font_size() >= median_font * ratio {
        return true;
    }
    line.fragments.len() == 1 && line.is_bold()
}

fn span(lines: &[Line]) -> BBox {
    lines
        .iter()
        .skip(1)
        .fold(lines[0].bbox, |acc, l| acc.union(&l.bbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;

    fn frag(text: &str, x: f32, y: f32) -> Fragment {
        Fragment::new(text, BBox::new(x, y, x + 6.0 * text.len() as f32, y + 10.0), 10.0)
    }

    fn thresholds() -> Thresholds {
        default_config().unwrap().thresholds
    }

    #[test]
    fn test_empty_page_yields_no_blocks() {
        assert!(segment_page(1, &[], &thresholds()).is_empty());
    }

    #[test]
    fn test_lines_sorted_left_to_right() {
        let fragments = vec![frag("B", 200.0, 101.0), frag("A", 50.0, 100.0), frag("C", 50.0, 130.0)];
        let lines = group_lines(1, &fragments, &thresholds());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "A B");
        assert_eq!(lines[1].text(), "C");
    }

    #[test]
    fn test_gap_splits_blocks() {
        let fragments = vec![
            frag("one", 50.0, 100.0),
            frag("two", 50.0, 114.0),
            frag("three", 50.0, 160.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 2);
        assert_eq!(blocks[1].lines[0].text(), "three");
        assert!(blocks[0].bbox.y1 <= blocks[1].bbox.y0);
    }

    #[test]
    fn test_heading_starts_block() {
        let mut title = frag("RENT ROLL", 50.0, 128.0);
        title.font_size = 14.0;
        title.bbox.y1 = title.bbox.y0 + 14.0;
        let fragments = vec![
            frag("Address: 1 Main St", 50.0, 100.0),
            frag("City: Springfield", 50.0, 114.0),
            title,
            frag("Unit", 50.0, 146.0),
            frag("101", 50.0, 160.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].lines[0].text(), "RENT ROLL");
        assert_eq!(blocks[1].lines.len(), 3);
    }

    #[test]
    fn test_consecutive_headings_stay_together() {
        let fragments = vec![
            frag("Intro", 50.0, 80.0),
            frag("UNIT MIX", 50.0, 100.0).bold(),
            frag("Current", 50.0, 114.0).bold(),
            frag("1BR 10", 50.0, 128.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].lines.len(), 3);
    }

    #[test]
    fn test_partition_covers_every_fragment_once() {
        let mut fragments = Vec::new();
        for row in 0..12 {
            for col in 0..4 {
                let y = 100.0 + row as f32 * 14.0 + if row > 5 { 40.0 } else { 0.0 };
                let jitter = (col as f32) * 0.7;
                fragments.push(frag(&format!("r{row}c{col}"), 50.0 + col as f32 * 100.0, y + jitter));
            }
        }
        // Reverse so input order carries no information.
        fragments.reverse();
        let blocks = segment_page(1, &fragments, &thresholds());

        let mut texts: Vec<String> = blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.fragments.iter().map(|f| f.text.clone()))
            .collect();
        texts.sort();
        let mut expected: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        expected.sort();
        assert_eq!(texts, expected);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.lines.iter().all(|l| l.fragments.len() == 4)));
    }

    fn tall(text: &str, x: f32, y0: f32, y1: f32) -> Fragment {
        Fragment::new(text, BBox::new(x, y0, x + 30.0, y1), 10.0)
    }

    fn assert_disjoint(blocks: &[Block]) {
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                assert!(a.bbox.y1 <= b.bbox.y0, "{:?} overlaps {:?}", a.bbox, b.bbox);
            }
        }
    }

    #[test]
    fn test_tall_fragment_keeps_lines_it_reaches() {
        let fragments = vec![
            frag("a", 50.0, 100.0),
            tall("tall", 200.0, 90.0, 200.0),
            frag("b", 50.0, 150.0),
            frag("c", 50.0, 180.0),
            frag("d", 50.0, 230.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 4);
        assert_eq!(blocks[1].lines[0].text(), "d");
        assert_disjoint(&blocks);
    }

    #[test]
    fn test_overlapping_blocks_are_merged() {
        // "b" starts a new block after a gap, but the tall box that joins it
        // reaches back up over "a".
        let fragments = vec![
            frag("a", 50.0, 100.0),
            frag("b", 50.0, 140.0),
            tall("tall", 200.0, 60.0, 260.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 3);
        assert_eq!(blocks[0].index, 0);
    }

    #[test]
    fn test_degenerate_boxes_tolerated() {
        let fragments = vec![
            Fragment::new("a", BBox::new(10.0, 10.0, 10.0, 10.0), 10.0),
            Fragment::new("b", BBox::new(30.0, 12.0, 20.0, 11.0), 10.0),
            Fragment::new("a", BBox::new(10.0, 10.0, 10.0, 10.0), 10.0),
        ];
        let blocks = segment_page(1, &fragments, &thresholds());
        let count: usize = blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|l| l.fragments.len())
            .sum();
        assert_eq!(count, 3);
        for b in &blocks {
            for l in &b.lines {
                for f in &l.fragments {
                    assert!(f.bbox.x1 >= f.bbox.x0);
                }
            }
        }
    }
}
