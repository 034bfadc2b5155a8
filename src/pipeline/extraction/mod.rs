pub mod types;
pub mod pdf;
pub mod docx;
pub mod plain;
pub mod orchestrator;

pub use types::*;
pub use pdf::*;
pub use docx::*;
pub use plain::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file type '{0}'. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Word document parsing failed: {0}")]
    DocxParsing(String),

    #[error("Text encoding error: {0}")]
    EncodingError(String),
}
