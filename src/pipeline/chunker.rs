use serde::Serialize;

use crate::config::DEFAULT_CHUNK_WORDS;

/// One bounded slice of a document, sent to the model as a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// 1-based position within the document.
    pub index: usize,
    /// Words of the slice re-joined with single spaces.
    pub text: String,
    pub word_count: usize,
}

/// Splits extracted text into inference-sized chunks.
pub trait Chunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Fixed word-budget chunker.
///
/// Tokenizes on whitespace runs and emits consecutive slices of exactly
/// `max_words` words; only the last slice may be shorter. Line structure is not
/// preserved.
pub struct WordChunker {
    max_words: usize,
}

impl WordChunker {
    /// A zero budget is treated as one word per chunk.
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_WORDS)
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let words: Vec<&str> = text.split_whitespace().collect();

        let chunks: Vec<TextChunk> = words
            .chunks(self.max_words)
            .enumerate()
            .map(|(i, slice)| TextChunk {
                index: i + 1,
                text: slice.join(" "),
                word_count: slice.len(),
            })
            .collect();

        tracing::debug!(
            words = words.len(),
            budget = self.max_words,
            chunks = chunks.len(),
            "Text chunked"
        );
        chunks
    }
}
