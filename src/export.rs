//! CSV and JSON output files with stable column names.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisOutput;
use crate::models::{Biomarker, LabRecord, WearableMetric};
use crate::pipeline::processor::BatchResult;
use crate::timeline::DailyGrid;

pub const LAB_RECORDS_FILE: &str = "lab_records.csv";
pub const DAILY_GRID_FILE: &str = "daily_grid.csv";
pub const CORRELATIONS_FILE: &str = "correlations.json";
pub const WINDOW_SUMMARIES_FILE: &str = "window_summaries.json";
pub const DOCUMENTS_FILE: &str = "documents.json";

const LAB_RECORD_COLUMNS: [&str; 10] = [
    "date",
    "biomarker",
    "value",
    "unit",
    "flag",
    "censored",
    "reference_low",
    "reference_high",
    "panel",
    "mentions",
];

/// Separator between labels of several events on one day.
const EVENT_SEPARATOR: &str = "; ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Column names of `daily_grid.csv`, identical for every run.
pub fn grid_header() -> Vec<String> {
    let mut header = vec!["date".to_string(), "events".to_string()];
    for metric in WearableMetric::ALL {
        header.push(metric.as_str().to_string());
        header.push(format!("{}_present", metric.as_str()));
    }
    for biomarker in Biomarker::ALL {
        header.push(biomarker.as_str().to_string());
        header.push(format!("{}_flag", biomarker.as_str()));
        header.push(format!("{}_present", biomarker.as_str()));
    }
    header
}

pub fn write_lab_records(path: &Path, records: &[LabRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(LAB_RECORD_COLUMNS)?;

    for record in records {
        let m = &record.measurement;
        wtr.write_record([
            m.collection_date.to_string(),
            m.biomarker.as_str().to_string(),
            m.value.to_string(),
            m.unit.clone(),
            record.flag.as_str().to_string(),
            m.censored.map(|c| c.symbol()).unwrap_or_default().to_string(),
            optional(m.reference_low),
            optional(m.reference_high),
            m.panel.as_str().to_string(),
            record.mentions.to_string(),
        ])?;
    }

    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Wrote lab records");
    Ok(())
}

pub fn write_grid(path: &Path, grid: &DailyGrid) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(grid_header())?;

    for row in &grid.rows {
        let mut fields = vec![row.date.to_string(), row.events.join(EVENT_SEPARATOR)];
        for metric in WearableMetric::ALL {
            let value = row.wearable.get(*metric);
            fields.push(optional(value));
            fields.push(value.is_some().to_string());
        }
        for biomarker in Biomarker::ALL {
            match row.labs.get(biomarker) {
                Some(cell) => {
                    fields.push(cell.value.to_string());
                    fields.push(cell.flag.as_str().to_string());
                    fields.push("true".to_string());
                }
                None => {
                    fields.push(String::new());
                    fields.push(String::new());
                    fields.push("false".to_string());
                }
            }
        }
        wtr.write_record(&fields)?;
    }

    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), rows = grid.rows.len(), "Wrote daily grid");
    Ok(())
}

/// Pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

/// Write every output file into `out_dir`, creating it if needed.
pub fn export_all(
    out_dir: &Path,
    batch: &BatchResult,
    output: &AnalysisOutput,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let written = vec![
        out_dir.join(LAB_RECORDS_FILE),
        out_dir.join(DAILY_GRID_FILE),
        out_dir.join(CORRELATIONS_FILE),
        out_dir.join(WINDOW_SUMMARIES_FILE),
        out_dir.join(DOCUMENTS_FILE),
    ];
    write_lab_records(&written[0], &batch.assembly.records)?;
    write_grid(&written[1], &output.grid)?;
    write_json(&written[2], &output.correlations)?;
    write_json(&written[3], &output.summaries)?;
    write_json(&written[4], &batch.outcomes)?;

    tracing::info!(dir = %out_dir.display(), files = written.len(), "Exported results");
    Ok(written)
}
