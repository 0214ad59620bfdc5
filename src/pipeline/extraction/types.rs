use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Panel;
use crate::pipeline::DocumentError;

/// A lab document to process, with an optional panel hint from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub path: PathBuf,
    pub panel_hint: Option<Panel>,
}

impl DocumentInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            panel_hint: None,
        }
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panel_hint = Some(panel);
        self
    }

    /// Stable identifier derived from the path, identical across runs.
    pub fn document_id(&self) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            self.path.to_string_lossy().as_bytes(),
        )
    }

    /// File name used in logs and diagnostics.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// One line of document text in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub content: String,
    pub page_index: usize,
    /// Position within its page, after blank lines are dropped.
    pub line_index: usize,
}

/// PDF text extraction abstraction
pub trait PdfExtractor {
    /// Raw text of each page, in page order.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, String>;
}

/// Main extraction trait (allows mocking for tests)
pub trait TextExtractor {
    fn extract(&self, document: &DocumentInput) -> Result<Vec<TextLine>, DocumentError>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract(&self, document: &DocumentInput) -> Result<Vec<TextLine>, DocumentError> {
        (**self).extract(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_stable_per_path() {
        let a = DocumentInput::new("/labs/bmp-2026-01-05.txt");
        let b = DocumentInput::new("/labs/bmp-2026-01-05.txt");
        let c = DocumentInput::new("/labs/cbc-2026-01-05.txt");
        assert_eq!(a.document_id(), b.document_id());
        assert_ne!(a.document_id(), c.document_id());
    }

    #[test]
    fn display_name_is_file_name() {
        let doc = DocumentInput::new("/labs/CBC Jan 5, 2026.pdf").with_panel(Panel::CompleteBloodCount);
        assert_eq!(doc.display_name(), "CBC Jan 5, 2026.pdf");
        assert_eq!(doc.panel_hint, Some(Panel::CompleteBloodCount));
    }
}
