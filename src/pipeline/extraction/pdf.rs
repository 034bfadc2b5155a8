use std::panic::{self, UnwindSafe};

use super::types::FormatConverter;
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned pages yield no text.
pub struct PdfTextConverter;

impl FormatConverter for PdfTextConverter {
    fn to_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = parse_guarded(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
                .map_err(|e| ExtractionError::PdfParsing(e.to_string()))
        })?;

        tracing::debug!(pages = pages.len(), "PDF text layer extracted");
        Ok(pages.join("\n"))
    }
}

/// pdf-extract panics on some malformed files instead of returning an error.
/// Turn that panic into a parsing error.
fn parse_guarded<T, F>(parse: F) -> Result<T, ExtractionError>
where
    F: FnOnce() -> Result<T, ExtractionError> + UnwindSafe,
{
    panic::catch_unwind(parse).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "malformed PDF".to_string());
        tracing::warn!(error = %message, "PDF parser panicked");
        Err(ExtractionError::PdfParsing(message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a single-page PDF with one line of Helvetica text using lopdf
    /// (the library pdf-extract reads with).
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_text_layer() {
        let bytes = make_test_pdf("Midterm Exam October 21");
        let text = PdfTextConverter.to_text(&bytes).unwrap();
        assert!(
            text.contains("Midterm") || text.contains("October"),
            "Expected syllabus text, got: {text}"
        );
    }

    #[test]
    fn parser_panic_becomes_parsing_error() {
        let result: Result<Vec<String>, _> = parse_guarded(|| panic!("invalid xref offset"));
        match result {
            Err(ExtractionError::PdfParsing(msg)) => assert!(msg.contains("invalid xref")),
            other => panic!("expected PdfParsing, got {other:?}"),
        }
    }

    #[test]
    fn truncated_pdf_does_not_unwind() {
        let mut bytes = make_test_pdf("Quiz 1 September 18");
        bytes.truncate(bytes.len() / 2);
        // Either outcome is fine as long as it comes back as a value.
        let _ = PdfTextConverter.to_text(&bytes);
    }

    #[test]
    fn invalid_pdf_returns_parsing_error() {
        let result = PdfTextConverter.to_text(b"not a pdf");
        assert!(matches!(result, Err(ExtractionError::PdfParsing(_))));
    }
}
