//! Splits document text into overlapping bounded segments for embedding.
//!
//! Two strategies:
//!
//! * token windows (primary) — encode the full text with the embedding
//!   model's tokenizer and slide a fixed-size window with fixed overlap;
//! * sentence packing (alternate) — greedily pack sentences under a
//!   character budget, seeding each new chunk with a trailing slice of its
//!   predecessor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiktoken_rs::{CoreBPE, cl100k_base};
use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Document, RagError};

/// One embeddable segment, carrying its document's provenance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Deterministic identifier: `{document_url}#chunk{index}`.
    pub id: String,
    pub text: String,
    pub title: String,
    pub category: String,
    pub document_url: String,
    pub chunk_index: usize,
}

#[derive(Clone, Debug)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            overlap_tokens: 200,
            max_chars: 1000,
            overlap_chars: 200,
        }
    }
}

#[derive(Clone)]
pub struct Chunker {
    bpe: Arc<CoreBPE>,
    config: ChunkerConfig,
}

impl Chunker {
    /// Builds a chunker over the `cl100k_base` vocabulary, the tokenizer
    /// family of the embedding model used at ingestion and query time.
    pub fn new(config: ChunkerConfig) -> Result<Self, RagError> {
        if config.max_tokens == 0 || config.overlap_tokens >= config.max_tokens {
            return Err(RagError::Chunking(format!(
                "overlap ({}) must be smaller than the window ({})",
                config.overlap_tokens, config.max_tokens
            )));
        }
        let bpe = cl100k_base().map_err(|err| RagError::Chunking(err.to_string()))?;
        Ok(Self {
            bpe: Arc::new(bpe),
            config,
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Token count of `text` under the embedding tokenizer.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Token-window chunking: fixed-size windows with fixed overlap, decoded
    /// back to text. The last window may be shorter than the window size.
    pub fn token_chunks(&self, text: &str) -> Result<Vec<String>, RagError> {
        let tokens = self.bpe.encode_ordinary(text);
        let mut chunks = Vec::new();
        for (start, end) in window_bounds(
            tokens.len(),
            self.config.max_tokens,
            self.config.overlap_tokens,
        ) {
            let window = tokens[start..end].to_vec();
            let chunk = self
                .bpe
                .decode(window)
                .map_err(|err| RagError::Chunking(err.to_string()))?;
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Sentence-packing chunking under a character budget, with a trailing
    /// character overlap carried into each new chunk.
    pub fn sentence_chunks(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in text.split_sentence_bounds() {
            if current.len() + sentence.len() <= self.config.max_chars {
                current.push_str(sentence);
                continue;
            }
            if !current.trim().is_empty() {
                chunks.push(current.trim().to_string());
            }
            let seed = trailing_chars(&current, self.config.overlap_chars);
            current = format!("{seed} {sentence}");
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }
        chunks
    }

    /// Chunks one document with the token-window strategy, attaching
    /// provenance metadata and positional ids. Empty windows are dropped;
    /// their indices are still consumed so ids stay stable.
    pub fn chunk_document(&self, doc: &Document) -> Result<Vec<Chunk>, RagError> {
        let mut chunks = Vec::new();
        for (index, text) in self.token_chunks(&doc.content)?.into_iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            chunks.push(Chunk {
                id: format!("{}#chunk{}", doc.url, index),
                text,
                title: doc.title.clone(),
                category: doc.category.clone(),
                document_url: doc.url.clone(),
                chunk_index: index,
            });
        }
        Ok(chunks)
    }

    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>, RagError> {
        let mut chunks = Vec::new();
        for doc in documents {
            chunks.extend(self.chunk_document(doc)?);
        }
        Ok(chunks)
    }
}

/// Start/end offsets of each window over a sequence of `len` tokens.
fn window_bounds(len: usize, max_tokens: usize, overlap: usize) -> Vec<(usize, usize)> {
    let step = max_tokens - overlap;
    let mut bounds = Vec::new();
    let mut start = 0;
    while start < len {
        bounds.push((start, (start + max_tokens).min(len)));
        start += step;
    }
    bounds
}

/// Last `count` characters of `s`, respecting char boundaries.
fn trailing_chars(s: &str, count: usize) -> String {
    let total = s.chars().count();
    s.chars().skip(total.saturating_sub(count)).collect()
}
