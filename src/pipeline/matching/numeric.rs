//! Value and reference-range token parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Censoring;

/// Plain number, optionally with comma thousands groups: `95`, `4.2`, `1,234.5`, `.5`.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)$").unwrap()
});

/// Leading value token of a result tail, with optional censoring comparator.
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<cmp><=|>=|≤|≥|<|>)?\s*(?P<num>\d[\d,]*(?:\.\d+)?|\.\d+)(?P<suffix>\S*)")
        .unwrap()
});

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<lo>\d[\d,]*(?:\.\d+)?)\s*(?:-|–|\bto\b)\s*(?P<hi>\d[\d,]*(?:\.\d+)?)",
    )
    .unwrap()
});

static BOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(\[])(?P<cmp><=|>=|≤|≥|<|>)\s*(?P<bound>\d[\d,]*(?:\.\d+)?)").unwrap()
});

/// Abnormal markers printed next to values. Ignored: flags are recomputed from the range.
const FLAG_TOKENS: &[&str] = &[
    "h", "l", "hh", "ll", "a", "*", "high", "low", "(h)", "(l)", "[h]", "[l]", "crit",
];

/// Parsed result value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueToken {
    pub value: f64,
    pub censored: Option<Censoring>,
    /// Text following the value (unit, flag, range…).
    pub rest: String,
}

/// Reference bounds printed with a result. At least one side is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// Parse a number token, accepting thousands separators. Rejects malformed groupings.
pub fn parse_number(token: &str) -> Option<f64> {
    if !NUMBER_RE.is_match(token) {
        return None;
    }
    token.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn censoring(cmp: &str) -> Option<Censoring> {
    match cmp {
        "<" => Some(Censoring::LessThan),
        "<=" | "≤" => Some(Censoring::LessOrEqual),
        ">" => Some(Censoring::GreaterThan),
        ">=" | "≥" => Some(Censoring::GreaterOrEqual),
        _ => None,
    }
}

pub fn is_flag_token(token: &str) -> bool {
    FLAG_TOKENS.contains(&token.to_ascii_lowercase().as_str())
}

/// Read the value at the start of `tail`.
///
/// The number may be glued to a unit (`95mg/dL`) or a flag (`140H`); any other
/// trailing characters make the token malformed.
pub fn parse_value(
    tail: &str,
    looks_like_unit: impl Fn(&str) -> bool,
) -> Result<ValueToken, String> {
    let first = tail.split_whitespace().next().unwrap_or("");
    let caps = VALUE_RE
        .captures(tail)
        .ok_or_else(|| format!("non-numeric value '{first}'"))?;

    let num = &caps["num"];
    let value = parse_number(num).ok_or_else(|| format!("malformed number '{num}'"))?;

    let suffix = &caps["suffix"];
    if !suffix.is_empty() && !is_flag_token(suffix) && !looks_like_unit(suffix) {
        return Err(format!("malformed value '{first}'"));
    }

    let censored = caps.name("cmp").and_then(|m| censoring(m.as_str()));
    let consumed = caps[0].len() - suffix.len();
    let rest = tail[consumed..].trim().to_string();

    Ok(ValueToken {
        value,
        censored,
        rest,
    })
}

/// Find a reference range in `text`: `lo-hi`, `lo to hi`, or a one-sided `<hi` / `>lo`.
///
/// Returns `Ok(None)` when no range is printed and `Err` when the printed
/// range is unusable (e.g. inverted).
pub fn parse_reference_range(text: &str) -> Result<Option<ReferenceRange>, String> {
    if let Some(caps) = RANGE_RE.captures(text) {
        let lo = parse_number(&caps["lo"]);
        let hi = parse_number(&caps["hi"]);
        return match (lo, hi) {
            (Some(lo), Some(hi)) if lo <= hi => Ok(Some(ReferenceRange {
                low: Some(lo),
                high: Some(hi),
            })),
            (Some(lo), Some(hi)) => Err(format!("inverted reference range {lo}-{hi}")),
            _ => Err(format!("malformed reference range '{}'", &caps[0])),
        };
    }

    if let Some(caps) = BOUND_RE.captures(text) {
        let bound = parse_number(&caps["bound"])
            .ok_or_else(|| format!("malformed reference bound '{}'", caps[0].trim()))?;
        let range = match &caps["cmp"] {
            "<" | "<=" | "≤" => ReferenceRange {
                low: None,
                high: Some(bound),
            },
            _ => ReferenceRange {
                low: Some(bound),
                high: None,
            },
        };
        return Ok(Some(range));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_like(token: &str) -> bool {
        token.contains('/') || token == "%"
    }

    #[test]
    fn numbers_with_separators_and_decimals() {
        assert_eq!(parse_number("95"), Some(95.0));
        assert_eq!(parse_number("4.2"), Some(4.2));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("250,000"), Some(250000.0));
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn malformed_numbers_rejected() {
        assert_eq!(parse_number("12,34"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn value_followed_by_unit_and_range() {
        let v = parse_value("95 mg/dL 70-100", unit_like).unwrap();
        assert_eq!(v.value, 95.0);
        assert_eq!(v.censored, None);
        assert_eq!(v.rest, "mg/dL 70-100");
    }

    #[test]
    fn value_glued_to_unit_or_flag() {
        let v = parse_value("95mg/dL", unit_like).unwrap();
        assert_eq!(v.value, 95.0);
        assert_eq!(v.rest, "mg/dL");

        let v = parse_value("140H mg/dL", unit_like).unwrap();
        assert_eq!(v.value, 140.0);
        assert_eq!(v.rest, "H mg/dL");
    }

    #[test]
    fn censored_values_keep_boundary() {
        let v = parse_value("<5 mg/L", unit_like).unwrap();
        assert_eq!(v.value, 5.0);
        assert_eq!(v.censored, Some(Censoring::LessThan));

        let v = parse_value("> 60 mL/min", unit_like).unwrap();
        assert_eq!(v.value, 60.0);
        assert_eq!(v.censored, Some(Censoring::GreaterThan));

        let v = parse_value("≥90", unit_like).unwrap();
        assert_eq!(v.censored, Some(Censoring::GreaterOrEqual));
    }

    #[test]
    fn non_numeric_values_rejected() {
        assert!(parse_value("see note", unit_like).is_err());
        assert!(parse_value("Negative", unit_like).is_err());
        assert!(parse_value("12a4 mg/dL", unit_like).is_err());
        assert!(parse_value("12,34 mg/dL", unit_like).is_err());
        assert!(parse_value("", unit_like).is_err());
    }

    #[test]
    fn two_sided_ranges() {
        let r = parse_reference_range("mg/dL 70-100").unwrap().unwrap();
        assert_eq!((r.low, r.high), (Some(70.0), Some(100.0)));

        let r = parse_reference_range("(3.5 - 5.1)").unwrap().unwrap();
        assert_eq!((r.low, r.high), (Some(3.5), Some(5.1)));

        let r = parse_reference_range("150 to 400").unwrap().unwrap();
        assert_eq!((r.low, r.high), (Some(150.0), Some(400.0)));

        let r = parse_reference_range("4,500-11,000").unwrap().unwrap();
        assert_eq!((r.low, r.high), (Some(4500.0), Some(11000.0)));
    }

    #[test]
    fn one_sided_ranges() {
        let r = parse_reference_range("mg/dL <200").unwrap().unwrap();
        assert_eq!((r.low, r.high), (None, Some(200.0)));

        let r = parse_reference_range("(>59)").unwrap().unwrap();
        assert_eq!((r.low, r.high), (Some(59.0), None));
    }

    #[test]
    fn missing_range_is_none() {
        assert_eq!(parse_reference_range("mg/dL").unwrap(), None);
        assert_eq!(parse_reference_range("").unwrap(), None);
    }

    #[test]
    fn inverted_range_is_an_error() {
        assert!(parse_reference_range("100-70").is_err());
    }

    #[test]
    fn flag_tokens() {
        assert!(is_flag_token("H"));
        assert!(is_flag_token("low"));
        assert!(is_flag_token("(L)"));
        assert!(!is_flag_token("mg/dL"));
    }
}
