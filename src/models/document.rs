use serde::{Deserialize, Serialize};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PLAIN_TEXT: &str = "text/plain";

/// Declared media type of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    Docx,
    PlainText,
    /// Anything else, keeping the declared type for error reporting.
    Unsupported(String),
}

impl MediaType {
    /// Map a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MIME_PDF => Self::Pdf,
            MIME_DOCX => Self::Docx,
            MIME_PLAIN_TEXT => Self::PlainText,
            _ => Self::Unsupported(mime.trim().to_string()),
        }
    }

    pub fn as_mime(&self) -> &str {
        match self {
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::PlainText => MIME_PLAIN_TEXT,
            Self::Unsupported(declared) => declared,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

/// An uploaded file as handed to the pipeline. Consumed once by extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    media_type: MediaType,
    bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type,
            bytes,
        }
    }

    /// Convenience for callers that only know the declared MIME string.
    pub fn from_mime(name: impl Into<String>, mime: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, MediaType::from_mime(mime), bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
