//! Lab document pipeline: extract text → match biomarkers → assemble records.
//!
//! Each document is processed on its own; a failure in one never aborts the
//! batch. Only the final assembly step sees measurements from every document.

pub mod extraction;
pub mod matching;
pub mod assembly;
pub mod processor;

use serde::Serialize;
use thiserror::Error;

/// Why a document was excluded from assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparseableReason {
    NoCollectionDate,
    UnknownPanel,
}

impl UnparseableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCollectionDate => "no collection date found",
            Self::UnknownPanel => "panel type not recognized",
        }
    }
}

/// Per-document failures. Fatal for that document only.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Unreadable document {document}: {reason}")]
    UnreadableDocument { document: String, reason: String },

    #[error("Unparseable document {document}: {}", reason.as_str())]
    Unparseable {
        document: String,
        reason: UnparseableReason,
    },
}

impl DocumentError {
    pub fn unreadable(document: &str, reason: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            document: document.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unparseable(document: &str, reason: UnparseableReason) -> Self {
        Self::Unparseable {
            document: document.to_string(),
            reason,
        }
    }
}
