/// Sanitize extracted text before passing downstream.
/// Strips control characters, turns tabs into column gaps, trims every line
/// and drops blank ones. Medical punctuation and symbols are preserved.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' | '\r' | '\u{00A0}' => Some(' '),
            c if c.is_control() => None,
            // Zero-width characters left behind by PDF text layers
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => None,
            c => Some(c),
        })
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_bytes() {
        let clean = sanitize_extracted_text("Glucose\x00 95 mg/dL");
        assert_eq!(clean, "Glucose 95 mg/dL");
    }

    #[test]
    fn strips_control_characters() {
        let raw = "Sodium 139 mmol/L\x01\x02\x03\nCollected: 2026-01-05";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x01'));
        assert!(clean.contains("139 mmol/L"));
        assert!(clean.contains("2026-01-05"));
    }

    #[test]
    fn tabs_become_spaces() {
        assert_eq!(
            sanitize_extracted_text("Glucose\t95\tmg/dL\t70-100"),
            "Glucose 95 mg/dL 70-100"
        );
    }

    #[test]
    fn collapses_blank_lines_and_trims() {
        let raw = "  Line one  \r\n\r\n\n   \nLine two\n\n";
        assert_eq!(sanitize_extracted_text(raw), "Line one\nLine two");
    }

    #[test]
    fn preserves_units_ranges_and_comparators() {
        let raw = "eGFR >60 mL/min/1.73m² (≥60) µmol/L";
        assert_eq!(sanitize_extracted_text(raw), raw);
    }

    #[test]
    fn empty_and_control_only_input() {
        assert_eq!(sanitize_extracted_text(""), "");
        assert_eq!(sanitize_extracted_text("\x00\x01\x02"), "");
        assert_eq!(sanitize_extracted_text("\u{FEFF}\n\u{200B}"), "");
    }
}
