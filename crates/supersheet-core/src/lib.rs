pub mod assemble;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod parsing;
pub mod record;
pub mod table;

use config::schema::ExtractionConfig;
use error::SuperSheetError;
use extraction::{FragmentSource, PageFragments};
use model::{SectionKind, Table};
use record::SuperSheetRecord;
use tracing::{debug, warn};

/// Main API entry point: extract a SuperSheet record from PDF bytes.
///
/// Decodes the PDF with `source` and runs the pipeline over its pages. Only a
/// structural failure is an error; every other problem is reported in the
/// record's diagnostics.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    source: &dyn FragmentSource,
    config: &ExtractionConfig,
) -> Result<SuperSheetRecord, SuperSheetError> {
    let pages = source.extract_pages(pdf_bytes)?;
    debug!(backend = source.backend_name(), pages = pages.len(), "pdf decoded");
    extract_document(&pages, config)
}

/// Run the pipeline over already-decoded pages.
///
/// Segment each page into blocks, classify the blocks into regions, rebuild
/// the tables, extract and normalize fields, then assemble and validate the
/// record.
pub fn extract_document(
    pages: &[PageFragments],
    config: &ExtractionConfig,
) -> Result<SuperSheetRecord, SuperSheetError> {
    let fragment_count: usize = pages.iter().map(|p| p.fragments.len()).sum();
    if fragment_count == 0 {
        warn!(pages = pages.len(), "document has no text fragments");
        return Err(SuperSheetError::NoFragments);
    }

    let blocks: Vec<Vec<layout::Block>> = pages
        .iter()
        .map(|p| layout::segment_page(p.page_number, &p.fragments, &config.thresholds))
        .collect();
    debug!(
        fragments = fragment_count,
        blocks = blocks.iter().map(Vec::len).sum::<usize>(),
        "pages segmented"
    );

    let regions = classify::classify_document(blocks, config);
    if regions.iter().all(|r| r.kind == SectionKind::Unknown) {
        warn!(regions = regions.len(), "no region could be classified");
        return Err(SuperSheetError::NoClassifiedRegions {
            regions: regions.len(),
        });
    }

    let mut tables: Vec<Table> = Vec::new();
    let mut layout_diagnostics = Vec::new();
    for region in regions.iter().filter(|r| r.kind.is_tabular()) {
        let build = table::reconstruct(region, &config.thresholds);
        debug!(
            page = region.page,
            region = region.index,
            kind = %region.kind,
            rows = build.table.rows.len(),
            columns = build.table.columns.len(),
            "table reconstructed"
        );
        tables.push(build.table);
        layout_diagnostics.extend(build.diagnostics);
    }

    let mut fields = parsing::extract_fields(&regions, &tables, config);
    layout_diagnostics.append(&mut fields.diagnostics);
    fields.diagnostics = layout_diagnostics;

    Ok(assemble::assemble(fields, &regions, config))
}
