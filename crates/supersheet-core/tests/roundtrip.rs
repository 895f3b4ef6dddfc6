//! Render known values into a synthetic page, extract it again and compare.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use supersheet_core::config::builtin::default_config;
use supersheet_core::extract_document;
use supersheet_core::extraction::PageFragments;
use supersheet_core::model::{BBox, Fragment};

struct Plan {
    unit_type: &'static str,
    count: i64,
    sqft: Decimal,
    rent: Decimal,
}

struct Sheet {
    name: &'static str,
    plans: Vec<Plan>,
    noi: Decimal,
    cap_rate_pct: Decimal,
}

fn text(s: &str, x: f32, y: f32, size: f32) -> Fragment {
    Fragment::new(s, BBox::new(x, y, x + 0.6 * size * s.len() as f32, y + size), size)
}

/// "$1,234.50" style, which is how these reports print money.
fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let whole = rounded.trunc().abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let cents = (rounded.fract().abs() * dec!(100)).round();
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    if cents.is_zero() {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{:0>2}", cents.to_string())
    }
}

fn table_row(cells: [String; 4], y: f32, f: &mut Vec<Fragment>) {
    for (i, cell) in cells.iter().enumerate() {
        f.push(text(cell, 50.0 + 110.0 * i as f32, y, 10.0));
    }
}

fn render(sheet: &Sheet) -> PageFragments {
    let total: i64 = sheet.plans.iter().map(|p| p.count).sum();
    let mut f = vec![
        text(&format!("Property Name: {}", sheet.name), 50.0, 40.0, 10.0),
        text(&format!("Total Units: {total}"), 50.0, 54.0, 10.0),
        text("Unit Mix", 50.0, 90.0, 14.0).bold(),
    ];

    let mut y = 110.0;
    table_row(
        ["Unit Type".into(), "Units".into(), "Avg SF".into(), "Rent".into()],
        y,
        &mut f,
    );
    for plan in &sheet.plans {
        y += 14.0;
        table_row(
            [
                plan.unit_type.to_string(),
                plan.count.to_string(),
                plan.sqft.to_string(),
                money(plan.rent),
            ],
            y,
            &mut f,
        );
    }

    y += 40.0;
    f.push(text("Operating Data", 50.0, y, 14.0).bold());
    y += 20.0;
    f.push(text("NOI", 50.0, y, 10.0));
    f.push(text(&money(sheet.noi), 160.0, y, 10.0));
    y += 14.0;
    f.push(text("Cap Rate", 50.0, y, 10.0));
    f.push(text(&format!("{}%", sheet.cap_rate_pct), 160.0, y, 10.0));

    PageFragments {
        page_number: 1,
        fragments: f,
    }
}

#[test]
fn rendered_sheet_extracts_exactly() {
    let sheet = Sheet {
        name: "Maple Court",
        plans: vec![
            Plan { unit_type: "Studio", count: 8, sqft: dec!(480), rent: dec!(995) },
            Plan { unit_type: "1BR", count: 24, sqft: dec!(702.5), rent: dec!(1234.50) },
            Plan { unit_type: "2BR", count: 12, sqft: dec!(960), rent: dec!(1610.75) },
        ],
        noi: dec!(512345.67),
        cap_rate_pct: dec!(5.25),
    };

    let config = default_config().unwrap();
    let record = extract_document(&[render(&sheet)], &config).unwrap();

    assert!(record.diagnostics.is_empty(), "{:?}", record.diagnostics);
    assert_eq!(record.header.text("property_name"), Some("Maple Court"));
    assert_eq!(record.total_units, Some(44));
    assert_eq!(record.stated_total_units, Some(44));

    assert_eq!(record.unit_mix.len(), sheet.plans.len());
    for (row, plan) in record.unit_mix.iter().zip(&sheet.plans) {
        assert_eq!(row.unit_type_text(), Some(plan.unit_type));
        assert_eq!(row.count_value(), Some(plan.count));
        assert_eq!(row.size_sqft(), Some(plan.sqft));
        assert_eq!(row.rent_amount(), Some(plan.rent));
    }

    assert_eq!(record.financials.amount("net_operating_income"), Some(sheet.noi));
    assert_eq!(
        record.financials.amount("cap_rate"),
        Some(sheet.cap_rate_pct / dec!(100))
    );
}

#[test]
fn money_formatting_matches_report_style() {
    assert_eq!(money(dec!(1234.5)), "$1,234.50");
    assert_eq!(money(dec!(995)), "$995");
    assert_eq!(money(dec!(512345.67)), "$512,345.67");
}
