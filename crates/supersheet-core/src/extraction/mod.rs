pub mod pdftotext;

use crate::error::SuperSheetError;
use crate::model::Fragment;

/// Positioned text decoded from one page of a PDF, in no particular order.
#[derive(Debug, Clone, Default)]
pub struct PageFragments {
    /// 1-based page number.
    pub page_number: usize,
    pub fragments: Vec<Fragment>,
}

/// Trait for PDF decoding backends.
pub trait FragmentSource: Send + Sync {
    /// Decode PDF bytes into one `PageFragments` per page, including empty pages.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageFragments>, SuperSheetError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
