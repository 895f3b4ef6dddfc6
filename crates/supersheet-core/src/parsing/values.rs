use crate::config::schema::{AreaUnitDef, CurrencyDef, ExtractionConfig};
use crate::diagnostics::{Diagnostic, Issue};
use crate::parsing::normalize::{normalize_label, normalize_whitespace, MatchStrength};
use crate::record::{AreaUnit, Field, FieldKind, FieldValue, Provenance};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// How cleanly a value parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseQuality {
    /// The whole text was consumed by the expected format.
    Clean,
    /// A value was recovered but surrounding text had to be dropped or a
    /// format assumption made.
    Partial,
    /// Parsed, but outside the range the kind allows.
    OutOfRange,
}

impl ParseQuality {
    pub fn factor(&self) -> f64 {
        match self {
            ParseQuality::Clean => 1.0,
            ParseQuality::Partial => 0.6,
            ParseQuality::OutOfRange => 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure(pub String);

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A field together with the diagnostic its extraction produced, if any.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    pub field: Field,
    pub diagnostic: Option<Diagnostic>,
}

/// Normalize one raw value into a typed field.
///
/// Returns `None` for blank input. A value that cannot be parsed as `kind`
/// becomes a Text field holding the raw string with confidence 0 and an
/// `unparseable_value` diagnostic; it never fails the document.
pub fn normalize_field(
    name: &str,
    kind: FieldKind,
    raw: &str,
    strength: MatchStrength,
    provenance: Provenance,
    config: &ExtractionConfig,
) -> Option<FieldOutcome> {
    let raw = normalize_whitespace(raw);
    if raw.is_empty() {
        return None;
    }
    let diag_name = format!("{}.{}", provenance.section, name);

    let parsed = match kind {
        FieldKind::Text => Ok((FieldValue::Text { text: raw.clone() }, ParseQuality::Clean)),
        FieldKind::Address => {
            let quality = if raw.chars().any(|c| c.is_ascii_digit()) {
                ParseQuality::Clean
            } else {
                ParseQuality::Partial
            };
            Ok((FieldValue::Address { text: raw.clone() }, quality))
        }
        FieldKind::Currency => parse_currency(&raw, &config.currency).map(|(amount, q)| {
            (
                FieldValue::Currency {
                    amount,
                    currency: config.currency.code.clone(),
                },
                q,
            )
        }),
        FieldKind::Area => parse_area(&raw, &config.area_units).map(|(value, q)| {
            (
                FieldValue::Area {
                    value,
                    unit: AreaUnit::SquareFeet,
                },
                q,
            )
        }),
        FieldKind::Percentage => {
            parse_percentage(&raw).map(|(ratio, q)| (FieldValue::Percentage { ratio }, q))
        }
        FieldKind::Date => parse_date(&raw, &config.date_patterns).map(|(date, pattern)| {
            (
                FieldValue::Date {
                    date,
                    pattern: pattern.to_string(),
                },
                ParseQuality::Clean,
            )
        }),
        FieldKind::Integer => parse_integer(&raw).map(|(value, q)| (FieldValue::Integer { value }, q)),
    };

    let outcome = match parsed {
        Ok((value, quality)) => {
            let diagnostic = (quality == ParseQuality::OutOfRange).then(|| {
                Diagnostic::new(
                    &diag_name,
                    Issue::OutOfRange,
                    format!("'{raw}' normalizes to {value}, outside the expected range"),
                )
                .at(provenance)
            });
            FieldOutcome {
                field: Field {
                    name: name.to_string(),
                    value,
                    raw,
                    confidence: strength.score() * quality.factor(),
                    provenance,
                },
                diagnostic,
            }
        }
        Err(failure) => {
            let diagnostic = Diagnostic::new(
                &diag_name,
                Issue::UnparseableValue,
                format!("cannot parse '{raw}' as {kind}: {failure}"),
            )
            .at(provenance);
            FieldOutcome {
                field: Field {
                    name: name.to_string(),
                    value: FieldValue::Text { text: raw.clone() },
                    raw,
                    confidence: 0.0,
                    provenance,
                },
                diagnostic: Some(diagnostic),
            }
        }
    };
    Some(outcome)
}

/// Parse a money amount: "$1,234.50" -> 1234.50, "(500)" -> -500, "$1.2M" -> 1200000.
///
/// Currency symbols and thousands separators are stripped. Trailing text
/// such as "/mo" is dropped with a partial-quality result. More than one
/// decimal point is rejected.
pub fn parse_currency(s: &str, currency: &CurrencyDef) -> Result<(Decimal, ParseQuality), ParseFailure> {
    let mut t = s.trim().to_lowercase();
    let mut negative = false;

    if t.starts_with('(') && t.ends_with(')') && t.len() >= 2 {
        negative = true;
        t = t[1..t.len() - 1].to_string();
    }
    // Longest first so "us$" is not left as "us" after "$" is removed.
    let mut symbols: Vec<String> = currency.symbols.iter().map(|s| s.to_lowercase()).collect();
    symbols.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for symbol in symbols.iter().filter(|s| !s.is_empty()) {
        t = t.replace(symbol.as_str(), "");
    }
    t = t.replace([',', ' '], "");
    if let Some(rest) = t.strip_prefix('-') {
        negative = !negative;
        t = rest.to_string();
    }

    let (core, prefix, suffix) = split_numeric_core(&t)?;
    let multiplier = match suffix {
        "" => None,
        "k" => Some(Decimal::from(1_000)),
        "m" | "mm" | "mil" => Some(Decimal::from(1_000_000)),
        _ => None,
    };
    let quality = if prefix.is_empty() && (suffix.is_empty() || multiplier.is_some()) {
        ParseQuality::Clean
    } else {
        ParseQuality::Partial
    };

    let mut amount = parse_decimal(core)?;
    if let Some(m) = multiplier {
        amount = amount
            .checked_mul(m)
            .ok_or_else(|| ParseFailure(format!("'{core}{suffix}' is too large")))?;
    }
    if negative {
        amount = -amount;
    }
    Ok((amount, quality))
}

/// Parse an area and convert it to square feet: "1.5 acres" -> 65340.
///
/// A bare number is taken to be square feet already. A leading "-" or
/// surrounding parentheses make the value negative.
pub fn parse_area(s: &str, units: &[AreaUnitDef]) -> Result<(Decimal, ParseQuality), ParseFailure> {
    let mut t = s.trim().to_lowercase().replace(',', "");
    let mut negative = false;
    if t.starts_with('(') && t.ends_with(')') && t.len() >= 2 {
        negative = true;
        t = t[1..t.len() - 1].trim().to_string();
    }
    let (core, prefix, suffix) = split_numeric_core(&t)?;
    let prefix = match prefix.strip_suffix('-') {
        Some(rest) => {
            negative = !negative;
            rest.trim()
        }
        None => prefix,
    };
    let mut value = parse_decimal(core)?;
    if negative {
        value = -value;
    }

    let unit_text = normalize_label(suffix);
    let mut quality = if prefix.is_empty() {
        ParseQuality::Clean
    } else {
        ParseQuality::Partial
    };

    if unit_text.is_empty() {
        return Ok((value, quality));
    }

    let exact = units
        .iter()
        .find(|u| u.tokens.iter().any(|tok| normalize_label(tok) == unit_text));
    let unit = match exact {
        Some(u) => Some(u),
        None => {
            quality = ParseQuality::Partial;
            units.iter().find(|u| {
                u.tokens.iter().any(|tok| {
                    let tok = normalize_label(tok);
                    unit_text.starts_with(&format!("{tok} "))
                })
            })
        }
    };
    let factor = unit.map_or(Decimal::ONE, |u| u.square_feet);
    let converted = value
        .checked_mul(factor)
        .ok_or_else(|| ParseFailure(format!("'{core} {suffix}' is too large to convert to square feet")))?;
    Ok((converted.normalize(), quality))
}

/// Parse a percentage into a fraction: "95%" -> 0.95.
///
/// Without a "%" sign, values above 1 are read as percents and values up to
/// 1 as fractions, both with partial quality. Results outside [0, 1] are
/// kept but flagged as out of range.
pub fn parse_percentage(s: &str) -> Result<(Decimal, ParseQuality), ParseFailure> {
    let t = s.trim();
    let has_sign = t.contains('%');
    let cleaned: String = t.chars().filter(|c| *c != '%' && !c.is_whitespace()).collect();
    let (core, prefix, suffix) = split_numeric_core(&cleaned)?;
    let negative = prefix == "-";
    let mut value = parse_decimal(core)?;
    if negative {
        value = -value;
    }

    let (ratio, mut quality) = if has_sign {
        (value / Decimal::ONE_HUNDRED, ParseQuality::Clean)
    } else if value.abs() <= Decimal::ONE {
        (value, ParseQuality::Partial)
    } else {
        (value / Decimal::ONE_HUNDRED, ParseQuality::Partial)
    };
    if (!prefix.is_empty() && !negative) || !suffix.is_empty() {
        quality = ParseQuality::Partial;
    }
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        quality = ParseQuality::OutOfRange;
    }
    Ok((ratio.normalize(), quality))
}

/// Try each pattern in order; the first that parses wins.
pub fn parse_date<'a>(s: &str, patterns: &'a [String]) -> Result<(NaiveDate, &'a str), ParseFailure> {
    let t = normalize_whitespace(s);
    patterns
        .iter()
        .find_map(|p| NaiveDate::parse_from_str(&t, p).ok().map(|d| (d, p.as_str())))
        .ok_or_else(|| ParseFailure("no accepted date pattern matched".into()))
}

/// Parse a whole number: "1,250" -> 1250, "15 units" -> 15 (partial).
pub fn parse_integer(s: &str) -> Result<(i64, ParseQuality), ParseFailure> {
    let t = s.trim().replace(',', "");
    if let Ok(v) = t.parse::<i64>() {
        return Ok((v, ParseQuality::Clean));
    }
    let (core, prefix, suffix) = split_numeric_core(&t)?;
    let value = parse_decimal(core)?;
    if !value.fract().is_zero() {
        return Err(ParseFailure(format!("'{core}' is not a whole number")));
    }
    let mut v: i64 = value
        .trunc()
        .to_string()
        .parse()
        .map_err(|_| ParseFailure(format!("'{core}' is out of range")))?;
    if prefix == "-" {
        v = -v;
    }
    let quality = if suffix.is_empty() && (prefix.is_empty() || prefix == "-") && !core.contains('.') {
        ParseQuality::Clean
    } else {
        ParseQuality::Partial
    };
    Ok((v, quality))
}

/// Split text into (prefix, numeric core, suffix) around the first run of
/// digits and dots. Returned as (core, trimmed prefix, trimmed suffix).
fn split_numeric_core(t: &str) -> Result<(&str, &str, &str), ParseFailure> {
    let start = t
        .find(|c: char| c.is_ascii_digit() || c == '.')
        .ok_or_else(|| ParseFailure("no digits".into()))?;
    let end = t[start..]
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map_or(t.len(), |i| start + i);
    let core = &t[start..end];
    if !core.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseFailure("no digits".into()));
    }
    if core.matches('.').count() > 1 {
        return Err(ParseFailure(format!("'{core}' has more than one decimal point")));
    }
    Ok((core, t[..start].trim(), t[end..].trim()))
}

fn parse_decimal(s: &str) -> Result<Decimal, ParseFailure> {
    Decimal::from_str(s).map_err(|e| ParseFailure(format!("invalid number '{s}': {e}")))
}
