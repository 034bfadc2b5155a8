use super::types::FormatConverter;
use super::ExtractionError;

/// Plain-text passthrough. Requires valid UTF-8; a leading BOM is dropped.
pub struct PlainTextConverter;

impl FormatConverter for PlainTextConverter {
    fn to_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::EncodingError(e.to_string()))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_text_through() {
        let text = PlainTextConverter
            .to_text(b"Lab report, March 3rd\nFinal exam, May 12th")
            .unwrap();
        assert_eq!(text, "Lab report, March 3rd\nFinal exam, May 12th");
    }

    #[test]
    fn strips_byte_order_mark() {
        let text = PlainTextConverter.to_text("\u{feff}Essay 2".as_bytes()).unwrap();
        assert_eq!(text, "Essay 2");
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let result = PlainTextConverter.to_text(&[0x66, 0xff, 0xfe, 0x6f]);
        assert!(matches!(result, Err(ExtractionError::EncodingError(_))));
    }
}
