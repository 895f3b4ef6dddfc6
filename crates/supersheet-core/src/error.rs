use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SuperSheetError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("document contains no text fragments")]
    NoFragments,

    #[error("none of the {regions} region(s) in the document could be classified as a SuperSheet section")]
    NoClassifiedRegions { regions: usize },

    #[error("failed to load extraction config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid extraction config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SuperSheetError {
    /// True for failures where no partial record exists: the document had no
    /// text at all, or nothing in it looked like a SuperSheet section.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SuperSheetError::NoFragments | SuperSheetError::NoClassifiedRegions { .. }
        )
    }
}
