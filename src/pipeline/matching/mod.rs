//! Biomarker pattern matching over extracted document lines.
//!
//! A document is matched in three steps: resolve its panel (hint, filename,
//! content), resolve its collection date, then scan every line for a known
//! biomarker name followed by a value. Lines that name a biomarker but carry
//! an unusable value become warnings instead of measurements.

pub mod dates;
pub mod numeric;
pub mod rules;

pub use dates::{find_date, resolve_collection_date, DateSource};
pub use numeric::{parse_number, parse_reference_range, parse_value, ReferenceRange, ValueToken};
pub use rules::{
    infer_panel, looks_like_unit, match_candidates, match_line, panel_order, BiomarkerRule,
    RuleMatch, RULE_TABLE,
};

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Biomarker, Censoring, Measurement, Panel, SourceRef};
use crate::pipeline::extraction::{DocumentInput, TextLine};
use crate::pipeline::{DocumentError, UnparseableReason};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// A line that named a biomarker but could not produce a measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementParseWarning {
    pub document_id: Uuid,
    pub document: String,
    pub page_index: usize,
    pub line_index: usize,
    pub biomarker: Biomarker,
    pub line: String,
    pub reason: String,
}

/// Everything matched in one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMatch {
    pub panel: Panel,
    pub collection_date: NaiveDate,
    pub date_source: DateSource,
    pub measurements: Vec<Measurement>,
    pub warnings: Vec<MeasurementParseWarning>,
}

/// Value, unit and range read from the text after a biomarker name.
#[derive(Debug, Clone, PartialEq)]
struct ParsedResult {
    value: f64,
    censored: Option<Censoring>,
    unit: &'static str,
    range: Option<ReferenceRange>,
}

/// First unit-shaped token in `text`, with its byte span.
fn find_unit_token(text: &str) -> Option<(usize, usize, &str)> {
    TOKEN_RE.find_iter(text).find_map(|m| {
        let token = m
            .as_str()
            .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | ','));
        looks_like_unit(token).then_some((m.start(), m.end(), token))
    })
}

fn parse_result(rule: &BiomarkerRule, tail: &str) -> Result<ParsedResult, String> {
    let token = parse_value(tail, looks_like_unit)?;

    let (unit, remainder) = match find_unit_token(&token.rest) {
        Some((start, end, printed)) => {
            let unit = rule
                .accepts(printed)
                .ok_or_else(|| format!("unit '{printed}' not valid for {}", rule.biomarker))?;
            let remainder = format!("{} {}", &token.rest[..start], &token.rest[end..]);
            (unit, remainder)
        }
        None => (rule.canonical_unit(), token.rest.clone()),
    };

    let range = parse_reference_range(&remainder)?;

    Ok(ParsedResult {
        value: token.value,
        censored: token.censored,
        unit,
        range,
    })
}

/// Match all biomarker lines of one document.
///
/// Fails only when the document as a whole is unusable (no panel, no date);
/// individual bad lines are reported in [`DocumentMatch::warnings`].
pub fn match_document(
    document: &DocumentInput,
    lines: &[TextLine],
) -> Result<DocumentMatch, DocumentError> {
    let name = document.display_name();

    let panel = document
        .panel_hint
        .or_else(|| infer_panel(&name, lines))
        .ok_or_else(|| DocumentError::unparseable(&name, UnparseableReason::UnknownPanel))?;

    let (collection_date, date_source) = resolve_collection_date(&name, lines)
        .ok_or_else(|| DocumentError::unparseable(&name, UnparseableReason::NoCollectionDate))?;

    let document_id = document.document_id();
    let order = panel_order(panel);
    let mut measurements = Vec::new();
    let mut warnings = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let candidates = match_candidates(&line.content, &order);
        if candidates.is_empty() {
            i += 1;
            continue;
        }

        // Value printed on the following line
        let continuation = lines.get(i + 1).filter(|next| {
            next.page_index == line.page_index && match_line(&next.content, &order).is_none()
        });

        // First candidate whose value parses; otherwise the first candidate's failure
        let mut first_failure = None;
        let mut accepted = None;
        for hit in &candidates {
            let (tail, consumed) = match (hit.tail.is_empty(), continuation) {
                (true, Some(next)) => (next.content.as_str(), 2),
                _ => (hit.tail, 1),
            };
            let parsed = if tail.is_empty() {
                Err("no value after biomarker name".to_string())
            } else {
                parse_result(hit.rule, tail)
            };
            match parsed {
                Ok(result) => {
                    accepted = Some((hit, result, consumed));
                    break;
                }
                Err(reason) => {
                    first_failure.get_or_insert((hit, reason, consumed));
                }
            }
        }

        let (hit, parsed, consumed) = match (accepted, first_failure) {
            (Some((hit, result, consumed)), _) => (hit, Ok(result), consumed),
            (None, Some((hit, reason, consumed))) => (hit, Err(reason), consumed),
            (None, None) => {
                i += 1;
                continue;
            }
        };

        match parsed {
            Ok(result) => measurements.push(Measurement {
                biomarker: hit.rule.biomarker,
                value: result.value,
                unit: result.unit.to_string(),
                reference_low: result.range.and_then(|r| r.low),
                reference_high: result.range.and_then(|r| r.high),
                collection_date,
                panel: hit.panel,
                censored: result.censored,
                source: SourceRef {
                    document_id,
                    page_index: line.page_index,
                    line_index: line.line_index,
                },
            }),
            Err(reason) => {
                tracing::warn!(
                    document = %name,
                    page = line.page_index,
                    line = line.line_index,
                    biomarker = hit.rule.biomarker.as_str(),
                    reason = %reason,
                    "Skipping unparseable result line"
                );
                warnings.push(MeasurementParseWarning {
                    document_id,
                    document: name.clone(),
                    page_index: line.page_index,
                    line_index: line.line_index,
                    biomarker: hit.rule.biomarker,
                    line: line.content.clone(),
                    reason,
                });
            }
        }

        i += consumed;
    }

    tracing::debug!(
        document = %name,
        panel = panel.as_str(),
        date = %collection_date,
        date_source = date_source.as_str(),
        measurements = measurements.len(),
        warnings = warnings.len(),
        "Matched document"
    );

    Ok(DocumentMatch {
        panel,
        collection_date,
        date_source,
        measurements,
        warnings,
    })
}
