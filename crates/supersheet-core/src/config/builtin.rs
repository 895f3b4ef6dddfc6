use crate::config::parse_config_str;
use crate::config::schema::ExtractionConfig;
use crate::error::SuperSheetError;

pub const SUPERSHEET_JSON: &str = include_str!("../../../../config/supersheet.json");

/// Available predefined extraction profiles.
pub const PRESETS: &[&str] = &["supersheet"];

/// Load a predefined extraction profile by name.
pub fn load_preset(name: &str) -> Result<ExtractionConfig, SuperSheetError> {
    match name {
        "supersheet" => parse_config_str(SUPERSHEET_JSON),
        _ => Err(SuperSheetError::ConfigInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// The default SuperSheet profile.
pub fn default_config() -> Result<ExtractionConfig, SuperSheetError> {
    load_preset("supersheet")
}
