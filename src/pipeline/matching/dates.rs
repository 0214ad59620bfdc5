//! Collection date resolution for lab documents.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::pipeline::extraction::TextLine;

/// Lines scanned for a labeled or header date.
pub const TOP_REGION_LINES: usize = 20;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?P<y>\d{4})-(?P<m>\d{1,2})-(?P<d>\d{1,2})\b").unwrap());

static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?P<m>\d{1,2})/(?P<d>\d{1,2})/(?P<y>\d{4})\b").unwrap());

/// `Feb 16, 2026`, `February 16 2026`, `Sept. 3, 2026`
static TEXT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<mon>[A-Za-z]{3,9})\.?\s+(?P<d>\d{1,2}),?\s+(?P<y>\d{4})\b").unwrap()
});

/// `16-Feb-2026`
static DAY_MON_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<d>\d{1,2})[-\s](?P<mon>[A-Za-z]{3,9})[-\s](?P<y>\d{4})\b").unwrap()
});

static COLLECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:date\s+collected|collection\s+date|specimen\s+collected|collected|date\s+of\s+service|drawn)\b",
    )
    .unwrap()
});

/// Dates on these lines are never the collection date.
static EXCLUDED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:dob|d\.o\.b|date\s+of\s+birth|birth|reported|received|printed)\b")
        .unwrap()
});

/// Where the collection date of a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// A line labeled "Collected", "Date of Service"...
    Labeled,
    /// First unlabeled date in the top region.
    Header,
    FileName,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labeled => "labeled",
            Self::Header => "header",
            Self::FileName => "file_name",
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let month = match lower.as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

fn numeric(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn date_from(caps: &Captures) -> Option<NaiveDate> {
    let month = match caps.name("mon") {
        Some(m) => month_number(m.as_str())?,
        None => numeric(caps, "m")?,
    };
    let year = i32::try_from(numeric(caps, "y")?).ok()?;
    NaiveDate::from_ymd_opt(year, month, numeric(caps, "d")?)
}

/// Earliest valid date in `text`, across all supported formats.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    [&*ISO_DATE, &*US_DATE, &*TEXT_DATE, &*DAY_MON_DATE]
        .into_iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            date_from(&caps).map(|date| (start, date))
        })
        .min_by_key(|(start, _)| *start)
        .map(|(_, date)| date)
}

fn labeled_date(region: &[TextLine]) -> Option<NaiveDate> {
    region.iter().enumerate().find_map(|(i, line)| {
        let label = COLLECTION_LABEL.find(&line.content)?;
        let after = &line.content[label.end()..];
        // "Collected:" alone on a line, date on the next one
        find_date(after).or_else(|| {
            region
                .get(i + 1)
                .filter(|next| !EXCLUDED_LABEL.is_match(&next.content))
                .and_then(|next| find_date(&next.content))
        })
    })
}

fn header_date(region: &[TextLine]) -> Option<NaiveDate> {
    region
        .iter()
        .filter(|line| !EXCLUDED_LABEL.is_match(&line.content))
        .find_map(|line| find_date(&line.content))
}

/// Resolve the collection date: labeled line, then top-region date, then filename.
pub fn resolve_collection_date(
    file_name: &str,
    lines: &[TextLine],
) -> Option<(NaiveDate, DateSource)> {
    let region = &lines[..lines.len().min(TOP_REGION_LINES)];

    if let Some(date) = labeled_date(region) {
        return Some((date, DateSource::Labeled));
    }
    if let Some(date) = header_date(region) {
        return Some((date, DateSource::Header));
    }
    let normalized = file_name.replace('_', " ");
    find_date(&normalized).map(|date| (date, DateSource::FileName))
}
