use supersheet_core::config::{builtin, load_config};
use supersheet_core::diagnostics::Severity;
use supersheet_core::error::SuperSheetError;
use supersheet_core::extraction::pdftotext::PdftotextSource;
use std::path::PathBuf;

use crate::output;

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    word_gap: f32,
) -> Result<(), SuperSheetError> {
    if !PdftotextSource::is_available() {
        return Err(SuperSheetError::PdftotextNotFound);
    }
    let config = match config_file {
        Some(path) => load_config(&path)?,
        None => builtin::default_config()?,
    };
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let source = PdftotextSource::with_word_gap_ratio(word_gap);
    let record = supersheet_core::extract_pdf(&pdf_bytes, &source, &config)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&record)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} field(s) from {}, written to {}",
                record.confidence.field_count,
                pdf_file.display(),
                path.display()
            );
            let errors = record
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count();
            if errors > 0 {
                eprintln!("  {errors} diagnostic(s) need review");
            }
        }
        None => match output_format {
            "json" => output::json::print(&record)?,
            _ => output::table::print(&record),
        },
    }

    Ok(())
}
