//! Request-level entry points.
//!
//! Two independent paths, both returning caller-ready text and never an error:
//!
//! ```text
//! process: raw text -> parse -> validate -> chunk -> [store.put] -> format
//! fetch:   key + index -> store.get -> format
//! ```
//!
//! Every failure (no edits found, invalid edits, unknown key, bad index) is rendered as a
//! diagnostic string, because the caller relays the result straight to a person.

use std::sync::Arc;

use crate::{
    format_response, summarize_edits, validate_edits, ChunkCapacity, ChunkStore, EditChunk,
    EditChunker, EditParser, EditRecord, Error, Pagination,
};

/// Phrase that starts the response when no edits could be extracted.
pub const NO_EDITS_FOUND: &str = "No edits found in the generated response.";

/// Edit count above which chunk 1 is prefixed with a per-file summary.
pub const DEFAULT_SUMMARY_THRESHOLD: usize = 5;

/// Turns raw generated text into paged edit responses, backed by a [`ChunkStore`].
///
/// ```rust
/// use std::sync::Arc;
/// use editslabs::{Coordinator, MemoryChunkStore};
///
/// let coordinator = Coordinator::new(Arc::new(MemoryChunkStore::default()));
/// let raw = "**FILE: a.rs:1**\n```\nOLD:\nold\nNEW:\nnew\n```";
/// let text = coordinator.process(raw, None, None, Some("rename things"));
/// assert!(text.contains("### Edit 1: a.rs"));
/// ```
pub struct Coordinator {
    store: Arc<dyn ChunkStore>,
    parser: EditParser,
    chunker: EditChunker,
    summary_threshold: usize,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("parser", &self.parser)
            .field("chunker", &self.chunker)
            .field("summary_threshold", &self.summary_threshold)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Coordinator with default grammars, capacity and summary threshold.
    #[must_use]
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self {
            store,
            parser: EditParser::default(),
            chunker: EditChunker::default(),
            summary_threshold: DEFAULT_SUMMARY_THRESHOLD,
        }
    }

    /// Override the per-chunk size bound.
    #[must_use]
    pub fn with_capacity(mut self, capacity: impl Into<ChunkCapacity>) -> Self {
        self.chunker = EditChunker::new(capacity);
        self
    }

    /// Override the grammar order.
    #[must_use]
    pub fn with_parser(mut self, parser: EditParser) -> Self {
        self.parser = parser;
        self
    }

    /// Override the edit count above which chunk 1 carries a summary.
    #[must_use]
    pub fn with_summary_threshold(mut self, threshold: usize) -> Self {
        self.summary_threshold = threshold;
        self
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// Serve a freshly generated result, or a cached chunk of it.
    ///
    /// With both `chunk_index` and `cache_key`, a cache hit with an in-range index is
    /// served directly. Otherwise `raw` is parsed, validated and chunked; when there is
    /// more than one chunk and a non-empty `prompt`, the chunks are cached under a key
    /// derived from `prompt`. The requested chunk is returned if in range, else chunk 1.
    #[must_use]
    pub fn process(
        &self,
        raw: &str,
        chunk_index: Option<usize>,
        cache_key: Option<&str>,
        prompt: Option<&str>,
    ) -> String {
        if let (Some(index), Some(key)) = (chunk_index, cache_key) {
            match self.cached_chunk(key, index) {
                Ok((chunks, chunk)) => {
                    log::debug!("serving cached chunk {index} of {} for {key}", chunks.len());
                    let mut result = format_response(
                        &chunk.edits,
                        Some(&Pagination::new(index, chunks.len()).with_key(key)),
                    );
                    if index == 1 && chunk.len() > self.summary_threshold {
                        let all = flatten(&chunks);
                        result = format!("{}\n\n{result}", summarize_edits(&all, false));
                    }
                    return result;
                }
                Err(err) => log::debug!("cached lookup failed ({err}), processing fresh result"),
            }
        }

        let edits = self.parser.parse(raw);
        if edits.is_empty() {
            return format!(
                "{NO_EDITS_FOUND} Please ensure the response uses the OLD/NEW edit format.\n\n{raw}"
            );
        }

        let validation = validate_edits(&edits);
        if !validation.valid {
            return format!("Edit validation failed:\n{}", validation.errors.join("\n"));
        }

        let chunks = self.chunker.chunk(&edits);
        let key = match prompt.filter(|p| !p.is_empty()) {
            Some(prompt) if chunks.len() > 1 => Some(self.store.put(prompt, &chunks)),
            _ => None,
        };

        let index = chunk_index
            .filter(|i| (1..=chunks.len()).contains(i))
            .unwrap_or(1);
        let chunk = &chunks[index - 1];

        let pagination = (chunks.len() > 1).then(|| Pagination {
            current: index,
            total: chunks.len(),
            cache_key: key.clone(),
        });
        let mut result = format_response(&chunk.edits, pagination.as_ref());
        if index == 1 && edits.len() > self.summary_threshold {
            result = format!("{}\n\n{result}", summarize_edits(&edits, chunks.len() > 1));
        }

        log::debug!(
            "parsed {} edits into {} chunks, returning chunk {index}{}",
            edits.len(),
            chunks.len(),
            key.map(|k| format!(" (cache key {k})")).unwrap_or_default()
        );
        result
    }

    /// Serve chunk `chunk_index` (1-based) of a previously cached result.
    #[must_use]
    pub fn fetch(&self, cache_key: &str, chunk_index: usize) -> String {
        log::debug!("fetching chunk {chunk_index} for cache key {cache_key}");

        let Some(chunks) = self.store.get(cache_key) else {
            return format!(
                "Cache miss: No chunks found for cache key \"{cache_key}\".\n\n\
                 Possible reasons:\n\
                 1. The cache key is incorrect, or the original request did not produce multiple chunks\n\
                 2. The cache has expired ({} TTL)\n\
                 3. The server was restarted or the cache was cleared\n\n\
                 Please re-run the original request to regenerate the chunks.",
                describe_ttl(self.store.ttl())
            );
        };

        let total = chunks.len();
        if chunk_index < 1 || chunk_index > total {
            return format!(
                "Invalid chunk index: {chunk_index}\n\n\
                 Available chunks: 1 to {total}\n\
                 You requested: {chunk_index}\n\n\
                 Please use a valid chunk index."
            );
        }

        let chunk = &chunks[chunk_index - 1];
        let mut result = format_response(
            &chunk.edits,
            Some(&Pagination::new(chunk_index, total).with_key(cache_key)),
        );
        if chunk_index == 1 && total > 1 {
            result = format!("{}\n\n{result}", summarize_edits(&flatten(&chunks), true));
        }

        log::debug!(
            "returning chunk {chunk_index} of {total} with {} edits",
            chunk.len()
        );
        result
    }

    fn cached_chunk(&self, key: &str, index: usize) -> crate::Result<(Vec<EditChunk>, EditChunk)> {
        let chunks = self
            .store
            .get(key)
            .ok_or_else(|| Error::CacheMiss(key.to_string()))?;
        if index < 1 || index > chunks.len() {
            return Err(Error::InvalidChunkIndex {
                index,
                total: chunks.len(),
            });
        }
        let chunk = chunks[index - 1].clone();
        Ok((chunks, chunk))
    }
}

fn flatten(chunks: &[EditChunk]) -> Vec<EditRecord> {
    chunks.iter().flat_map(|c| c.edits.iter().cloned()).collect()
}

fn describe_ttl(ttl: std::time::Duration) -> String {
    let secs = ttl.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let mins = secs / 60;
        format!("{mins} minute{}", if mins == 1 { "" } else { "s" })
    } else {
        format!("{secs} second{}", if secs == 1 { "" } else { "s" })
    }
}
