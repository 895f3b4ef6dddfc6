use supersheet_core::error::SuperSheetError;
use supersheet_core::record::SuperSheetRecord;

pub fn print(record: &SuperSheetRecord) -> Result<(), SuperSheetError> {
    let json = serde_json::to_string_pretty(record)?;
    println!("{json}");
    Ok(())
}
