use super::docx::DocxTextConverter;
use super::pdf::PdfTextConverter;
use super::plain::PlainTextConverter;
use super::types::{FormatConverter, TextExtractor};
use super::ExtractionError;
use crate::models::{MediaType, SourceDocument};

/// Concrete text extractor.
/// One converter per supported media type, injected as trait objects.
pub struct DocumentTextExtractor {
    pdf: Box<dyn FormatConverter + Send + Sync>,
    docx: Box<dyn FormatConverter + Send + Sync>,
    plain: Box<dyn FormatConverter + Send + Sync>,
}

impl DocumentTextExtractor {
    pub fn new(
        pdf: Box<dyn FormatConverter + Send + Sync>,
        docx: Box<dyn FormatConverter + Send + Sync>,
        plain: Box<dyn FormatConverter + Send + Sync>,
    ) -> Self {
        Self { pdf, docx, plain }
    }
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self::new(
            Box::new(PdfTextConverter),
            Box::new(DocxTextConverter),
            Box::new(PlainTextConverter),
        )
    }
}

impl TextExtractor for DocumentTextExtractor {
    fn extract(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        let converter = match document.media_type() {
            MediaType::Pdf => &self.pdf,
            MediaType::Docx => &self.docx,
            MediaType::PlainText => &self.plain,
            MediaType::Unsupported(mime) => {
                tracing::warn!(file = document.name(), mime = %mime, "Unsupported media type");
                return Err(ExtractionError::UnsupportedFormat(mime.clone()));
            }
        };

        tracing::info!(
            file = document.name(),
            media_type = document.media_type().as_mime(),
            bytes = document.bytes().len(),
            "Starting text extraction"
        );

        let text = converter.to_text(document.bytes())?;

        tracing::info!(
            file = document.name(),
            chars = text.len(),
            "Text extraction complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::models::{MIME_DOCX, MIME_PDF, MIME_PLAIN_TEXT};

    /// Returns a fixed label and counts its calls.
    struct StubConverter {
        label: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl FormatConverter for StubConverter {
        fn to_text(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.to_string())
        }
    }

    struct FailingConverter;

    impl FormatConverter for FailingConverter {
        fn to_text(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
            Err(ExtractionError::PdfParsing("truncated xref".into()))
        }
    }

    fn stub_extractor() -> (DocumentTextExtractor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let make = |label| {
            Box::new(StubConverter {
                label,
                calls: calls.clone(),
            }) as Box<dyn FormatConverter + Send + Sync>
        };
        let extractor = DocumentTextExtractor::new(make("pdf"), make("docx"), make("plain"));
        (extractor, calls)
    }

    #[test]
    fn dispatches_on_media_type() {
        let (extractor, calls) = stub_extractor();

        let cases = [
            (MIME_PDF, "pdf"),
            (MIME_DOCX, "docx"),
            (MIME_PLAIN_TEXT, "plain"),
        ];
        for (mime, expected) in cases {
            let doc = SourceDocument::from_mime("syllabus", mime, vec![1, 2, 3]);
            assert_eq!(extractor.extract(&doc).unwrap(), expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsupported_type_rejected_without_conversion() {
        let (extractor, calls) = stub_extractor();
        let doc = SourceDocument::from_mime("slides.pptx", "application/vnd.ms-powerpoint", vec![0]);

        let err = extractor.extract(&doc).unwrap_err();
        match err {
            ExtractionError::UnsupportedFormat(mime) => {
                assert_eq!(mime, "application/vnd.ms-powerpoint")
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn converter_failure_propagates() {
        let extractor = DocumentTextExtractor::new(
            Box::new(FailingConverter),
            Box::new(PlainTextConverter),
            Box::new(PlainTextConverter),
        );
        let doc = SourceDocument::from_mime("broken.pdf", MIME_PDF, vec![0x25, 0x50]);
        assert!(matches!(
            extractor.extract(&doc),
            Err(ExtractionError::PdfParsing(_))
        ));
    }

    #[test]
    fn default_extractor_reads_plain_text() {
        let doc = SourceDocument::from_mime(
            "notes.txt",
            MIME_PLAIN_TEXT,
            b"Reading response, February 2nd".to_vec(),
        );
        let text = DocumentTextExtractor::default().extract(&doc).unwrap();
        assert_eq!(text, "Reading response, February 2nd");
    }
}
