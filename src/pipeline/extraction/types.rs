use super::ExtractionError;
use crate::models::SourceDocument;

/// One file format → plain UTF-8 text. Implementations are black boxes to the
/// pipeline: they either return the document's text or fail.
pub trait FormatConverter {
    fn to_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Turns an uploaded document into plain text, dispatching on its media type.
pub trait TextExtractor {
    fn extract(&self, document: &SourceDocument) -> Result<String, ExtractionError>;
}
