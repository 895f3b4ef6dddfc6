use supersheet_core::record::{Field, SuperSheetRecord};

fn cell(field: &Option<Field>) -> String {
    field.as_ref().map(|f| f.value.to_string()).unwrap_or_default()
}

fn print_grid(headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        println!("  {}", padded.join("  ").trim_end());
    };
    line(headers.to_vec());
    for row in rows {
        line(row.iter().map(String::as_str).collect());
    }
    println!();
}

pub fn print(record: &SuperSheetRecord) {
    println!("=== Property ===\n");
    if record.header.fields.is_empty() {
        println!("  (no header fields found)\n");
    } else {
        let max_name = record.header.fields.keys().map(|k| k.len()).max().unwrap_or(10);
        for (name, field) in &record.header.fields {
            println!(
                "  {:<width$}  {}  ({:.2})",
                name,
                field.value,
                field.confidence,
                width = max_name
            );
        }
        println!();
    }

    match (record.total_units, record.stated_total_units) {
        (Some(total), Some(stated)) if total != stated => {
            println!("  Total units: {total} (header states {stated})\n")
        }
        (Some(total), _) => println!("  Total units: {total}\n"),
        (None, _) => {}
    }

    if !record.unit_mix.is_empty() {
        println!("=== Unit Mix ===\n");
        let rows: Vec<Vec<String>> = record
            .unit_mix
            .iter()
            .map(|r| vec![cell(&r.unit_type), cell(&r.count), cell(&r.size), cell(&r.rent)])
            .collect();
        print_grid(&["Type", "Units", "Size", "Rent"], &rows);
    }

    if !record.rent_roll.is_empty() {
        println!("=== Rent Roll ===\n");
        let rows: Vec<Vec<String>> = record
            .rent_roll
            .iter()
            .map(|r| {
                vec![
                    cell(&r.unit),
                    cell(&r.tenant),
                    cell(&r.size),
                    cell(&r.rent),
                    cell(&r.lease_end),
                    cell(&r.status),
                ]
            })
            .collect();
        print_grid(&["Unit", "Tenant", "Size", "Rent", "Lease End", "Status"], &rows);
    }

    if !record.financials.fields.is_empty() || !record.financials.unmatched.is_empty() {
        println!("=== Financials ===\n");
        let max_name = record
            .financials
            .fields
            .keys()
            .map(|k| k.len())
            .max()
            .unwrap_or(10);
        for (name, field) in &record.financials.fields {
            println!("  {:<width$}  {}", name, field.value, width = max_name);
        }
        for raw in &record.financials.unmatched {
            println!("  (unmatched) {raw}");
        }
        println!();
    }

    if !record.comments.is_empty() {
        println!("=== Comments ===\n");
        for comment in &record.comments {
            println!("  {comment}\n");
        }
    }

    let c = &record.confidence;
    println!(
        "Confidence: {:.2} over {} field(s), {} low; {} region(s), {} unclassified",
        c.overall, c.field_count, c.low_confidence_fields, c.region_count, c.unclassified_regions
    );

    if !record.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for d in &record.diagnostics {
            println!("  - {d}");
        }
    }
}
