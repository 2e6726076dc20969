//! Converts display strings like `"₹ 1,50,000"`, `"34,54,136.30 Crores"` or
//! `"(15.5)%"` into signed magnitudes in the base currency unit.

/// Scale words checked in priority order; the first match wins and an
/// optional trailing plural `s` is consumed with it. New scale words are
/// additive: extend the table, not the control flow.
const SCALE_WORDS: &[(&str, f64)] = &[
    ("crore", 10_000_000.0),
    ("lakh", 100_000.0),
    ("million", 1_000_000.0),
    ("billion", 1_000_000_000.0),
];

/// Bare suffixes honoured only when they directly follow a digit, so that
/// non-numeric residue containing these letters still fails to parse.
const SCALE_SUFFIXES: &[(char, f64)] = &[('m', 1_000_000.0), ('b', 1_000_000_000.0)];

/// Parses a heterogeneous numeric-with-unit display string into a float in
/// the base unit. Returns `None` when no numeric magnitude can be recovered;
/// callers treat that as "missing", never as zero.
pub fn normalize_currency(raw: &str) -> Option<f64> {
    // Strip currency symbols, digit-group separators and all whitespace.
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let mut lower = cleaned.to_lowercase();

    if lower.ends_with('%') {
        lower.pop();
    }

    let multiplier = extract_multiplier(&mut lower);

    // Parenthesized negatives: "(15.5)" means -15.5.
    let mut sign = 1.0;
    if lower.starts_with('(') && lower.ends_with(')') && lower.len() > 2 {
        sign = -1.0;
        lower = lower[1..lower.len() - 1].to_string();
    }

    let value: f64 = lower.parse().ok()?;
    Some(value * multiplier * sign)
}

/// Detects and removes a scale word (or a bare digit-adjacent `m`/`b`
/// suffix) from the working string, returning the multiplier. Defaults to 1.
fn extract_multiplier(text: &mut String) -> f64 {
    for &(word, factor) in SCALE_WORDS {
        if let Some(idx) = text.find(word) {
            let mut end = idx + word.len();
            if text[end..].starts_with('s') {
                end += 1;
            }
            text.replace_range(idx..end, "");
            return factor;
        }
    }

    // "100M" / "3.2b" style suffixes. The original matched these letters
    // anywhere in the string, which misclassified arbitrary text; requiring
    // a preceding digit confines the match to genuine suffixes.
    let mut chars = text.chars().rev();
    if let (Some(last), Some(prev)) = (chars.next(), chars.next()) {
        for &(suffix, factor) in SCALE_SUFFIXES {
            if last == suffix && prev.is_ascii_digit() {
                text.pop();
                return factor;
            }
        }
    }

    1.0
}
