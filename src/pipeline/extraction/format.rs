use serde::Serialize;

/// Broad document categories we handle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Image,
    Unsupported,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "plain_text",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Detect document format from magic bytes (NOT file extensions).
/// Anything that is not a known binary signature and decodes as UTF-8 is text.
pub fn detect_format(bytes: &[u8]) -> DocumentFormat {
    match bytes {
        [0x25, 0x50, 0x44, 0x46, ..] => DocumentFormat::Pdf,
        [0x89, 0x50, 0x4E, 0x47, ..] => DocumentFormat::Image,
        [0xFF, 0xD8, 0xFF, ..] => DocumentFormat::Image,
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => DocumentFormat::Image,
        _ if std::str::from_utf8(bytes).is_ok() => DocumentFormat::PlainText,
        _ => DocumentFormat::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf_signature() {
        assert_eq!(detect_format(b"%PDF-1.4\n..."), DocumentFormat::Pdf);
    }

    #[test]
    fn detects_images() {
        assert_eq!(detect_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), DocumentFormat::Image);
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]), DocumentFormat::Image);
        assert_eq!(detect_format(&[0x49, 0x49, 0x2A, 0x00]), DocumentFormat::Image);
    }

    #[test]
    fn utf8_is_plain_text() {
        assert_eq!(detect_format("Glucose 95 mg/dL".as_bytes()), DocumentFormat::PlainText);
        assert_eq!(detect_format("Résultat µg/L".as_bytes()), DocumentFormat::PlainText);
    }

    #[test]
    fn invalid_utf8_is_unsupported() {
        assert_eq!(detect_format(&[0x00, 0xC3, 0x28, 0xA0]), DocumentFormat::Unsupported);
    }
}
