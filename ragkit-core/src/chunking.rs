//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`TokenChunker`], a
//! splitter that bounds chunks by an estimated token count and prefers
//! paragraph and sentence boundaries over hard cuts.
//!
//! Chunks partition the document text exactly: concatenating the chunk
//! texts in order reproduces the original document, with no overlap and no
//! trimming. Splitting is lazy — the returned iterator produces one chunk
//! at a time, so the embedding stage can consume a large document without
//! materializing every chunk up front.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into an ordered, lazy sequence of chunks.
    ///
    /// The iterator is finite and restartable — calling `split` again
    /// yields a fresh iterator over the same chunks. An empty document
    /// yields no chunks.
    fn split<'a>(&'a self, document: &'a Document) -> Box<dyn Iterator<Item = Chunk> + Send + 'a>;
}

/// Whether a character belongs to the CJK ranges counted one token each.
fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x2E80..=0x303F      // radicals, punctuation
        | 0x3040..=0x30FF    // hiragana, katakana
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xF900..=0xFAFF    // compatibility ideographs
        | 0xFF00..=0xFFEF    // fullwidth forms
    )
}

/// Estimate the token count of a text.
///
/// Counts one token per whitespace-delimited word and one per CJK
/// character. This approximates a BPE tokenizer closely enough to bound
/// chunk sizes; swap in a real tokenizer if exact counts matter.
pub fn estimate_tokens(text: &str) -> usize {
    let mut tokens = 0;
    let mut in_word = false;
    for c in text.chars() {
        if is_cjk(c) {
            tokens += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            tokens += 1;
            in_word = true;
        }
    }
    tokens
}

/// Splits text into chunks bounded by an estimated token budget.
///
/// Within the budget, the cut point is the last paragraph break (`\n\n`),
/// falling back to the last sentence boundary, falling back to a hard cut
/// at a character boundary. Chunk IDs are generated as
/// `{document_id}_{chunk_index}`; each chunk inherits the parent document's
/// metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::TokenChunker;
///
/// let chunker = TokenChunker::new(500);
/// for chunk in chunker.split(&document) {
///     println!("{}", chunk.text);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TokenChunker {
    max_tokens: usize,
}

impl TokenChunker {
    /// Create a new `TokenChunker` with the given token budget per chunk.
    ///
    /// A budget of zero is treated as one.
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens: max_tokens.max(1) }
    }
}

impl Chunker for TokenChunker {
    fn split<'a>(&'a self, document: &'a Document) -> Box<dyn Iterator<Item = Chunk> + Send + 'a> {
        Box::new(TokenSplit { document, pos: 0, index: 0, max_tokens: self.max_tokens })
    }
}

/// Lazy iterator over a document's chunks.
struct TokenSplit<'a> {
    document: &'a Document,
    /// Byte offset of the next unconsumed character.
    pos: usize,
    index: usize,
    max_tokens: usize,
}

impl Iterator for TokenSplit<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let text = &self.document.text;
        if self.pos >= text.len() {
            return None;
        }
        let rest = &text[self.pos..];

        let end = match budget_prefix(rest, self.max_tokens) {
            // The whole remainder fits in the budget.
            None => rest.len(),
            Some(hard_end) => boundary_before(rest, hard_end).unwrap_or(hard_end),
        };

        let mut metadata = self.document.metadata.clone();
        metadata.insert("chunk_index".to_string(), self.index.to_string());

        let chunk = Chunk {
            id: format!("{}_{}", self.document.id, self.index),
            text: rest[..end].to_string(),
            embedding: Vec::new(),
            metadata,
            document_id: self.document.id.clone(),
        };

        self.pos += end;
        self.index += 1;
        Some(chunk)
    }
}

/// Find the byte length of the longest prefix of `text` whose estimated
/// token count stays within `max_tokens`.
///
/// Returns `None` if all of `text` fits.
fn budget_prefix(text: &str, max_tokens: usize) -> Option<usize> {
    let mut tokens = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        let delta = if is_cjk(c) {
            1
        } else if c.is_whitespace() || in_word {
            0
        } else {
            1
        };
        if tokens + delta > max_tokens && i > 0 {
            return Some(i);
        }
        tokens += delta;
        in_word = !c.is_whitespace() && !is_cjk(c);
    }
    None
}

/// Find the best natural cut point in `text` at or before byte `limit`.
///
/// Prefers the end of the last paragraph break, then the last sentence
/// terminator. Returns the byte offset to cut at, or `None` if no boundary
/// exists in range (the caller hard-cuts at `limit`).
fn boundary_before(text: &str, limit: usize) -> Option<usize> {
    let window = &text[..limit];

    if let Some(p) = window.rfind("\n\n") {
        if p > 0 {
            return Some(p + 2);
        }
    }

    let mut cut = None;
    for (i, c) in window.char_indices() {
        let after = i + c.len_utf8();
        let is_boundary = match c {
            '。' | '！' | '？' | '\n' => true,
            // ASCII terminators only count followed by whitespace, so
            // "3.14" does not split.
            '.' | '!' | '?' => text[after..].chars().next().map_or(true, |n| n.is_whitespace()),
            _ => false,
        };
        if is_boundary && after < limit {
            cut = Some(after);
        }
    }
    cut
}
