use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Biomarker, LabFlag, Panel};

/// Comparator printed in front of a censored lab value ("<5", ">=60").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Censoring {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Censoring {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

/// Where in a document a measurement was read.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    pub document_id: Uuid,
    pub page_index: usize,
    pub line_index: usize,
}

/// One biomarker reading extracted from a lab document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub biomarker: Biomarker,
    pub value: f64,
    pub unit: String,
    pub reference_low: Option<f64>,
    pub reference_high: Option<f64>,
    pub collection_date: NaiveDate,
    pub panel: Panel,
    pub censored: Option<Censoring>,
    pub source: SourceRef,
}

impl Measurement {
    pub fn has_reference_range(&self) -> bool {
        self.reference_low.is_some() || self.reference_high.is_some()
    }

    /// Compare the value against whichever reference bounds were printed.
    pub fn flag(&self) -> LabFlag {
        if !self.has_reference_range() {
            return LabFlag::Unknown;
        }
        if self.reference_low.is_some_and(|lo| self.value < lo) {
            return LabFlag::Low;
        }
        if self.reference_high.is_some_and(|hi| self.value > hi) {
            return LabFlag::High;
        }
        LabFlag::Normal
    }
}

/// Canonical lab entry for one `(collection_date, biomarker)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabRecord {
    pub measurement: Measurement,
    pub flag: LabFlag,
    /// Raw mentions that collapsed into this record (1 when unique).
    pub mentions: usize,
}

impl LabRecord {
    pub fn new(measurement: Measurement, mentions: usize) -> Self {
        let flag = measurement.flag();
        Self {
            measurement,
            flag,
            mentions,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.measurement.collection_date
    }

    pub fn biomarker(&self) -> Biomarker {
        self.measurement.biomarker
    }
}

#[cfg(test)]
pub(crate) fn sample_measurement(
    biomarker: Biomarker,
    value: f64,
    range: (Option<f64>, Option<f64>),
    date: &str,
) -> Measurement {
    Measurement {
        biomarker,
        value,
        unit: "mg/dL".into(),
        reference_low: range.0,
        reference_high: range.1,
        collection_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        panel: Panel::MetabolicPanel,
        censored: None,
        source: SourceRef {
            document_id: Uuid::nil(),
            page_index: 0,
            line_index: 0,
        },
    }
}
