use supersheet_core::config::{builtin, load_config};
use supersheet_core::error::SuperSheetError;
use supersheet_core::parsing::normalize::normalize_label;
use std::collections::HashMap;
use std::path::Path;

pub fn show() -> Result<(), SuperSheetError> {
    println!("{}", builtin::SUPERSHEET_JSON);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), SuperSheetError> {
    let config = load_config(file)?;

    println!("Config '{}' (v{}) is valid.", config.name, config.version);
    println!("  Header fields: {}", config.header_fields.len());
    println!(
        "  Table columns: {} unit mix, {} rent roll",
        config.tables.unit_mix.len(),
        config.tables.rent_roll.len()
    );
    println!("  Financial items: {}", config.financial_items.len());
    println!("  Date patterns: {}", config.date_patterns.join(", "));

    // Potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    let mut owners: HashMap<String, &str> = HashMap::new();
    for def in &config.header_fields {
        for label in &def.labels {
            let label = normalize_label(label);
            match owners.get(&label) {
                Some(owner) if *owner != def.field => warnings.push(format!(
                    "header label '{label}' is shared by '{owner}' and '{}'; the first wins",
                    def.field
                )),
                Some(_) => {}
                None => {
                    owners.insert(label, &def.field);
                }
            }
        }
    }
    if config.total_row_labels.is_empty() {
        warnings.push("no total_row_labels; totals rows will be read as data".to_string());
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
