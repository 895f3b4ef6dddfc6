use serde::{Deserialize, Serialize};

/// Canonical form for comparing labels and headers.
///
/// Lowercases, turns punctuation into spaces (keeping `#` and `%`, which carry
/// meaning in column headers) and collapses whitespace:
/// "Sq. Ft." -> "sq ft", "No. of Units" -> "no of units", "Rent/SF" -> "rent sf".
pub fn normalize_label(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_alphanumeric() || c == '#' || c == '%' {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalize_whitespace(&mapped)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How well a piece of document text matched a dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrength {
    /// No header was available; the column was mapped by position.
    Positional,
    /// Abbreviated or partial match ("Mkt Rent" for "market rent").
    Abbreviated,
    /// Identical after normalization.
    Exact,
}

impl MatchStrength {
    pub fn score(&self) -> f64 {
        match self {
            MatchStrength::Exact => 1.0,
            MatchStrength::Abbreviated => 0.7,
            MatchStrength::Positional => 0.5,
        }
    }
}

/// Compare document text against one dictionary entry.
///
/// Exact when the normalized forms are equal; abbreviated when both have the
/// same number of words and each word of `text` abbreviates the matching word
/// of `entry`.
pub fn match_label(text: &str, entry: &str) -> Option<MatchStrength> {
    let t = normalize_label(text);
    let e = normalize_label(entry);
    if t.is_empty() || e.is_empty() {
        return None;
    }
    if t == e {
        return Some(MatchStrength::Exact);
    }
    let tw: Vec<&str> = t.split(' ').collect();
    let ew: Vec<&str> = e.split(' ').collect();
    if tw.len() == ew.len() && tw.iter().zip(&ew).all(|(a, b)| a == b || abbreviates(a, b)) {
        return Some(MatchStrength::Abbreviated);
    }
    None
}

/// Strongest match of `text` against any of `entries`.
pub fn best_match<'a>(
    text: &str,
    entries: impl IntoIterator<Item = &'a String>,
) -> Option<MatchStrength> {
    entries
        .into_iter()
        .filter_map(|e| match_label(text, e))
        .max()
}

/// True when the words of `phrase` appear contiguously in `text`.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let t = normalize_label(text);
    let p = normalize_label(phrase);
    if p.is_empty() {
        return false;
    }
    let tw: Vec<&str> = t.split(' ').collect();
    let pw: Vec<&str> = p.split(' ').collect();
    tw.windows(pw.len()).any(|w| w == pw.as_slice())
}

/// "bldg" abbreviates "building": same first letter, letters in order, shorter.
/// A bare plural ("unit" vs "units") is not treated as an abbreviation.
fn abbreviates(short: &str, long: &str) -> bool {
    if short.chars().count() < 2 || short.len() >= long.len() {
        return false;
    }
    if long.strip_suffix('s') == Some(short) {
        return false;
    }
    let mut s = short.chars();
    let mut l = long.chars();
    if s.next() != l.next() {
        return false;
    }
    let mut rest = l;
    s.all(|c| rest.any(|lc| lc == c))
}

/// True when the text is mostly a number: currency, area, count, percentage.
pub fn is_numeric_like(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    let digits = t.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = t.chars().filter(|c| c.is_alphabetic()).count();
    digits > 0 && digits >= letters
}
