//! Batch document processing: extract → match per document, then assemble.
//!
//! Uses trait-based DI for the text extractor so the processor stays
//! testable with mock implementations. A document that fails is recorded in
//! its outcome and never aborts the batch.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Measurement, Panel};
use crate::pipeline::assembly::{assemble_lab_records, AssemblyReport};
use crate::pipeline::extraction::orchestrator::DocumentExtractor;
use crate::pipeline::extraction::types::{DocumentInput, TextExtractor};
use crate::pipeline::matching::{match_document, DateSource, MeasurementParseWarning};
use crate::pipeline::{DocumentError, UnparseableReason};

/// File extensions picked up from a documents directory.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "txt"];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Extracted {
        panel: Panel,
        collection_date: NaiveDate,
        date_source: DateSource,
        measurement_count: usize,
        warning_count: usize,
    },
    Unreadable {
        reason: String,
    },
    Unparseable {
        reason: UnparseableReason,
    },
}

/// Per-document entry of the batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutcome {
    pub document_id: Uuid,
    pub document: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
    pub warnings: Vec<MeasurementParseWarning>,
}

impl DocumentOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self.status, DocumentStatus::Extracted { .. })
    }
}

/// Outcome of a whole batch, in input order, plus the assembled records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<DocumentOutcome>,
    pub assembly: AssemblyReport,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct DocumentProcessor {
    extractor: Box<dyn TextExtractor + Send + Sync>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(Box::new(DocumentExtractor::default()))
    }
}

impl DocumentProcessor {
    pub fn new(extractor: Box<dyn TextExtractor + Send + Sync>) -> Self {
        Self { extractor }
    }

    /// Extract and match one document. Failures are folded into the outcome.
    pub fn process_document(
        &self,
        document: &DocumentInput,
    ) -> (DocumentOutcome, Vec<Measurement>) {
        let document_id = document.document_id();
        let name = document.display_name();

        let result = self
            .extractor
            .extract(document)
            .and_then(|lines| match_document(document, &lines));

        match result {
            Ok(matched) => {
                tracing::info!(
                    document_id = %document_id,
                    document = %name,
                    panel = matched.panel.as_str(),
                    date = %matched.collection_date,
                    measurements = matched.measurements.len(),
                    warnings = matched.warnings.len(),
                    "Processed lab document"
                );
                let outcome = DocumentOutcome {
                    document_id,
                    document: name,
                    status: DocumentStatus::Extracted {
                        panel: matched.panel,
                        collection_date: matched.collection_date,
                        date_source: matched.date_source,
                        measurement_count: matched.measurements.len(),
                        warning_count: matched.warnings.len(),
                    },
                    warnings: matched.warnings,
                };
                (outcome, matched.measurements)
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %document_id,
                    error = %e,
                    "Document skipped"
                );
                let status = match e {
                    DocumentError::UnreadableDocument { reason, .. } => {
                        DocumentStatus::Unreadable { reason }
                    }
                    DocumentError::Unparseable { reason, .. } => {
                        DocumentStatus::Unparseable { reason }
                    }
                };
                let outcome = DocumentOutcome {
                    document_id,
                    document: name,
                    status,
                    warnings: Vec::new(),
                };
                (outcome, Vec::new())
            }
        }
    }

    /// Process every document independently, then assemble lab records.
    pub fn process_batch(&self, documents: &[DocumentInput]) -> BatchResult {
        let mut outcomes = Vec::with_capacity(documents.len());
        let mut measurements = Vec::new();

        for document in documents {
            let (outcome, found) = self.process_document(document);
            outcomes.push(outcome);
            measurements.extend(found);
        }

        let extracted = outcomes.iter().filter(|o| o.is_extracted()).count();
        tracing::info!(
            documents = documents.len(),
            extracted,
            skipped = documents.len() - extracted,
            measurements = measurements.len(),
            "Batch processed"
        );

        BatchResult {
            outcomes,
            assembly: assemble_lab_records(measurements),
        }
    }
}

/// Lab documents (`.pdf`, `.txt`) directly inside `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> std::io::Result<Vec<DocumentInput>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            });
        if path.is_file() && supported {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths.into_iter().map(DocumentInput::new).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
