use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Biomarker, LabRecord, Measurement, SourceRef};

/// Values closer than this are the same reading printed twice.
const VALUE_TOLERANCE: f64 = 1e-9;

/// Mentions of one `(date, biomarker)` key that disagree in value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateConflict {
    pub collection_date: NaiveDate,
    pub biomarker: Biomarker,
    /// Value of the accepted mention.
    pub accepted: f64,
    /// Every value seen, in mention order.
    pub values: Vec<f64>,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    /// One record per `(collection_date, biomarker)`, sorted by that key.
    pub records: Vec<LabRecord>,
    pub conflicts: Vec<DuplicateConflict>,
}

fn mention_order(a: &Measurement, b: &Measurement) -> Ordering {
    a.collection_date
        .cmp(&b.collection_date)
        .then(a.biomarker.cmp(&b.biomarker))
        .then_with(|| a.source.cmp(&b.source))
}

/// Collapse raw measurements into one lab record per `(collection_date, biomarker)`.
///
/// The result does not depend on input order. Within a group the first
/// mention carrying a reference range is accepted, else the first mention.
/// Values are never averaged.
pub fn assemble_lab_records(mut measurements: Vec<Measurement>) -> AssemblyReport {
    measurements.sort_by(mention_order);

    let mut report = AssemblyReport::default();
    for group in measurements.chunk_by(|a, b| {
        a.collection_date == b.collection_date && a.biomarker == b.biomarker
    }) {
        let accepted = group
            .iter()
            .find(|m| m.has_reference_range())
            .unwrap_or(&group[0]);

        let disagrees = group
            .iter()
            .any(|m| (m.value - accepted.value).abs() > VALUE_TOLERANCE);
        if disagrees {
            tracing::warn!(
                date = %accepted.collection_date,
                biomarker = accepted.biomarker.as_str(),
                accepted = accepted.value,
                mentions = group.len(),
                "Conflicting values for one lab result"
            );
            report.conflicts.push(DuplicateConflict {
                collection_date: accepted.collection_date,
                biomarker: accepted.biomarker,
                accepted: accepted.value,
                values: group.iter().map(|m| m.value).collect(),
                sources: group.iter().map(|m| m.source.clone()).collect(),
            });
        }

        report
            .records
            .push(LabRecord::new(accepted.clone(), group.len()));
    }

    tracing::info!(
        records = report.records.len(),
        conflicts = report.conflicts.len(),
        "Assembled lab records"
    );

    report
}
