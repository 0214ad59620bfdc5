use super::format::{detect_format, DocumentFormat};
use super::pdf::PdfTextExtractor;
use super::sanitize::sanitize_extracted_text;
use super::types::{DocumentInput, PdfExtractor, TextExtractor, TextLine};
use crate::pipeline::DocumentError;

/// Page separator in plain-text exports.
const FORM_FEED: char = '\x0c';

/// Default extractor: plain text read directly, PDFs through their text layer.
pub struct DocumentExtractor {
    pdf: Box<dyn PdfExtractor + Send + Sync>,
}

impl DocumentExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor + Send + Sync>) -> Self {
        Self { pdf }
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(Box::new(PdfTextExtractor))
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, document: &DocumentInput) -> Result<Vec<TextLine>, DocumentError> {
        let name = document.display_name();
        let bytes = std::fs::read(&document.path)
            .map_err(|e| DocumentError::unreadable(&name, e.to_string()))?;

        let format = detect_format(&bytes);
        tracing::debug!(
            document = %name,
            format = format.as_str(),
            size_bytes = bytes.len(),
            "Detected document format"
        );

        let pages: Vec<String> = match format {
            DocumentFormat::PlainText => String::from_utf8(bytes)
                .map_err(|e| DocumentError::unreadable(&name, e.to_string()))?
                .split(FORM_FEED)
                .map(str::to_string)
                .collect(),
            DocumentFormat::Pdf => self
                .pdf
                .extract_pages(&bytes)
                .map_err(|e| DocumentError::unreadable(&name, format!("PDF parsing failed: {e}")))?,
            DocumentFormat::Image => {
                return Err(DocumentError::unreadable(
                    &name,
                    "image without a text layer",
                ));
            }
            DocumentFormat::Unsupported => {
                return Err(DocumentError::unreadable(&name, "unsupported format"));
            }
        };

        let lines = lines_from_pages(&pages);
        if lines.is_empty() {
            return Err(DocumentError::unreadable(&name, "no extractable text"));
        }

        tracing::info!(
            document = %name,
            pages = pages.len(),
            lines = lines.len(),
            "Extracted document text"
        );

        Ok(lines)
    }
}

/// Linearize sanitized pages into numbered lines.
pub fn lines_from_pages<S: AsRef<str>>(pages: &[S]) -> Vec<TextLine> {
    pages
        .iter()
        .enumerate()
        .flat_map(|(page_index, page)| {
            sanitize_extracted_text(page.as_ref())
                .lines()
                .enumerate()
                .map(|(line_index, content)| TextLine {
                    content: content.to_string(),
                    page_index,
                    line_index,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
