//! Document import orchestrator.
//!
//! Single entry point that drives the deadline pipeline:
//! extract → chunk → infer (per chunk) → parse → materialize (per candidate).
//!
//! Every collaborator sits behind a trait so the whole flow runs against
//! mocks in tests.

use std::sync::Arc;

use chrono::{Datelike, Local};
use serde::Serialize;

use crate::config::ImportConfig;
use crate::db::{DatabaseError, EventStore};
use crate::models::{CalendarEvent, SourceDocument};
use crate::pipeline::chunker::{Chunker, WordChunker};
use crate::pipeline::deadlines::{parse_reply, EventMaterializer, ItemOutcome, SkippedLine};
use crate::pipeline::extraction::{DocumentTextExtractor, ExtractionError, TextExtractor};
use crate::pipeline::inference::{InferenceError, InferenceService};
use crate::pipeline::progress::ProgressReporter;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Pipeline position. Transitions only move forward; `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Extracting,
    Chunking,
    Inferring,
    Parsing,
    Materializing,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Chunking => "chunking",
            Self::Inferring => "inferring",
            Self::Parsing => "parsing",
            Self::Materializing => "materializing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StageTracker {
    current: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: PipelineStage::Idle,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        debug_assert!(next > self.current, "stage {next} after {}", self.current);
        tracing::debug!(from = %self.current, to = %next, "Pipeline stage");
        self.current = next;
    }

    fn fail(&mut self, error: &ImportError) {
        debug_assert_eq!(error.stage(), self.current, "{error} raised outside its stage");
        tracing::warn!(
            stage = %self.current,
            kind = error.kind().as_str(),
            error = %error,
            "Import failed"
        );
        self.current = PipelineStage::Failed;
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// User-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    UnsupportedFormat,
    EngineUnavailable,
    ExtractionFailed,
    InferenceFailed,
    StoreFailed,
}

impl ImportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::EngineUnavailable => "engine_unavailable",
            Self::ExtractionFailed => "extraction_failed",
            Self::InferenceFailed => "inference_failed",
            Self::StoreFailed => "store_failed",
        }
    }
}

/// Fatal import failures. Events created before the failure are kept.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported file type '{0}'")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(ExtractionError),

    #[error("Inference engine unavailable for model '{model}': {reason}")]
    EngineUnavailable {
        model: String,
        reason: String,
        remediation: String,
    },

    #[error("Inference failed: {0}")]
    Inference(InferenceError),

    #[error("Saving events failed: {0}")]
    Store(#[from] DatabaseError),
}

impl From<ExtractionError> for ImportError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat(mime) => Self::UnsupportedFormat(mime),
            other => Self::Extraction(other),
        }
    }
}

impl From<InferenceError> for ImportError {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::EngineUnavailable {
                model,
                reason,
                remediation,
            } => Self::EngineUnavailable {
                model,
                reason,
                remediation,
            },
            other => Self::Inference(other),
        }
    }
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ImportErrorKind::UnsupportedFormat,
            Self::Extraction(_) => ImportErrorKind::ExtractionFailed,
            Self::EngineUnavailable { .. } => ImportErrorKind::EngineUnavailable,
            Self::Inference(_) => ImportErrorKind::InferenceFailed,
            Self::Store(_) => ImportErrorKind::StoreFailed,
        }
    }

    /// Stage that was running when the error occurred.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::UnsupportedFormat(_) | Self::Extraction(_) => PipelineStage::Extracting,
            Self::EngineUnavailable { .. } | Self::Inference(_) => PipelineStage::Inferring,
            Self::Store(_) => PipelineStage::Materializing,
        }
    }

    /// Message suitable for showing to the person who uploaded the file.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat(mime) => format!(
                "Unsupported file type '{mime}'. Please upload a PDF, DOCX, or TXT file."
            ),
            Self::Extraction(e) => format!("Could not read the document: {e}"),
            Self::EngineUnavailable { remediation, .. } => {
                format!("The AI model could not be started. {remediation}")
            }
            Self::Inference(e) => format!("The AI model stopped responding: {e}"),
            Self::Store(_) => {
                "Some events could not be saved. Events already imported were kept.".to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome of one `process_document` call.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub document_name: String,
    pub course: String,
    pub chunks_sent: usize,
    /// Non-blank reply lines examined.
    pub lines_seen: usize,
    pub events: Vec<CalendarEvent>,
    pub skipped: Vec<SkippedLine>,
}

impl ImportReport {
    fn empty(document: &SourceDocument, course: String) -> Self {
        Self {
            document_name: document.name().to_string(),
            course,
            chunks_sent: 0,
            lines_seen: 0,
            events: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn created_count(&self) -> usize {
        self.events.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates deadline import: extract → chunk → infer → parse → materialize.
///
/// Strictly sequential. Overlapping calls queue on the shared inference
/// service for the duration of their inference stage.
pub struct DeadlineImporter {
    extractor: Box<dyn TextExtractor + Send + Sync>,
    chunker: Box<dyn Chunker + Send + Sync>,
    inference: Arc<InferenceService>,
    store: Arc<dyn EventStore + Send + Sync>,
    year: Option<i32>,
}

impl DeadlineImporter {
    pub fn new(
        extractor: Box<dyn TextExtractor + Send + Sync>,
        chunker: Box<dyn Chunker + Send + Sync>,
        inference: Arc<InferenceService>,
        store: Arc<dyn EventStore + Send + Sync>,
    ) -> Self {
        Self {
            extractor,
            chunker,
            inference,
            store,
            year: None,
        }
    }

    /// Resolve dates in `year` instead of the current local year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Turn an uploaded document into calendar events for `owner_id`.
    ///
    /// `on_progress` receives non-decreasing values in 0..=100 on the calling
    /// thread and sees exactly 100 on success. On failure progress stays at
    /// its last value.
    pub fn process_document(
        &self,
        document: &SourceDocument,
        owner_id: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<ImportReport, ImportError> {
        let _span = tracing::info_span!(
            "process_document",
            document = %document.name(),
            owner = owner_id
        )
        .entered();

        let mut progress = ProgressReporter::new(on_progress);
        let mut stages = StageTracker::new();

        self.run(document, owner_id, &mut progress, &mut stages)
            .inspect_err(|e| stages.fail(e))
    }

    fn run(
        &self,
        document: &SourceDocument,
        owner_id: &str,
        progress: &mut ProgressReporter<'_>,
        stages: &mut StageTracker,
    ) -> Result<ImportReport, ImportError> {
        let year = self.year.unwrap_or_else(|| Local::now().year());
        let materializer =
            EventMaterializer::new(self.store.as_ref(), owner_id, document.name(), year);
        let mut report = ImportReport::empty(document, materializer.course().to_string());

        // Step 1: Extract text
        stages.enter(PipelineStage::Extracting);
        let text = self.extractor.extract(document)?;

        // Step 2: Chunk
        stages.enter(PipelineStage::Chunking);
        let chunks = self.chunker.chunk(&text);
        progress.extracted();

        if chunks.is_empty() {
            tracing::info!("Document has no text, nothing to import");
            progress.finish();
            stages.enter(PipelineStage::Completed);
            return Ok(report);
        }

        // Step 3: Inference, one turn per chunk, in order
        stages.enter(PipelineStage::Inferring);
        let format = self.inference.reply_format();
        let mut replies = String::new();
        {
            let mut session = self.inference.begin(document.name())?;
            for chunk in &chunks {
                let reply = session.send(&chunk.text)?;
                tracing::debug!(
                    chunk = chunk.index,
                    of = chunks.len(),
                    words = chunk.word_count,
                    reply_chars = reply.len(),
                    "Chunk answered"
                );
                replies.push_str(&reply);
                replies.push('\n');
                report.chunks_sent += 1;
                progress.chunk_answered(chunk.index, chunks.len());
            }
        }

        // Step 4: Parse
        stages.enter(PipelineStage::Parsing);
        let parsed = parse_reply(&replies, format);
        report.lines_seen = parsed.lines_seen;
        report.skipped = parsed.skipped;

        // Step 5: Materialize, one event per candidate
        stages.enter(PipelineStage::Materializing);
        let total = parsed.candidates.len();
        for (i, candidate) in parsed.candidates.iter().enumerate() {
            match materializer.materialize(candidate)? {
                ItemOutcome::Created(event) => report.events.push(event),
                ItemOutcome::Skipped(skipped) => report.skipped.push(skipped),
            }
            progress.candidate_processed(i + 1, total);
        }

        progress.finish();
        stages.enter(PipelineStage::Completed);

        tracing::info!(
            course = %report.course,
            chunks = report.chunks_sent,
            created = report.created_count(),
            skipped = report.skipped_count(),
            "Import complete"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a `DeadlineImporter` with production implementations.
///
/// - Extraction: pdf-extract / docx-rs / UTF-8
/// - Chunking: `WordChunker` with the configured budget
/// - Inference: the process-wide Ollama-backed `InferenceService`
///
/// The engine itself is built lazily on the first import.
pub fn build_importer(
    config: &ImportConfig,
    store: Arc<dyn EventStore + Send + Sync>,
) -> DeadlineImporter {
    tracing::info!(
        model = %config.model,
        chunk_words = config.chunk_words,
        reply_format = %config.reply_format,
        "Deadline importer configured"
    );
    DeadlineImporter::new(
        Box::new(DocumentTextExtractor::default()),
        Box::new(WordChunker::new(config.chunk_words)),
        InferenceService::shared(config),
        store,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
