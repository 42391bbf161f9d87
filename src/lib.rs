//! # editslabs
//!
//! Extract edit blocks from generated text, pack them into size-bounded chunks, and
//! cache the chunks so later parts can be fetched by separate, stateless requests.
//!
//! ## The Problem
//!
//! A text-generation backend asked for code changes may produce dozens of edits. The
//! channel that relays them to a caller has a practical size limit. You need to:
//!
//! - Pull structured edits out of free-form text (the backend's formatting drifts)
//! - Split them deterministically, without ever cutting an edit in half
//! - Keep one file's edits together whenever they fit, so each chunk can be applied on its own
//! - Let the caller come back for chunk 2 later without resending anything
//!
//! ## Pipeline
//!
//! ```text
//! raw text ─▶ parse ─▶ validate ─▶ chunk ─▶ [store.put] ─▶ format ─▶ text
//!
//! key + index ─▶ store.get ─▶ format ─▶ text
//! ```
//!
//! ### Parsing
//!
//! Grammars are tried in order; the first one producing any edit wins. See
//! [`Grammar`] for the accepted formats.
//!
//! ### Chunking
//!
//! Edits are grouped by file (first-seen order) and packed greedily:
//!
//! ```text
//! limit 20,000 est. chars
//!
//! a.rs  [3,000]  b.rs [4,000]   c.rs [9,000 | 9,000 | 9,000]
//!
//! Chunk 1: a.rs + b.rs        7,000
//! Chunk 2: c.rs #1 + c.rs #2 18,000   <- c.rs alone exceeds the limit,
//! Chunk 3: c.rs #3            9,000      so it is split per edit
//! ```
//!
//! ### Caching
//!
//! Multi-chunk results are stored under an 8-hex-char key derived from the prompt, with
//! a 10 minute TTL and a 50 entry cap. Stores never fail loudly: a broken write shows up
//! later as a cache miss, and the caller can always regenerate.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use editslabs::{CacheConfig, Coordinator, FileChunkStore};
//!
//! let dir = std::env::temp_dir().join("editslabs-doc-quickstart");
//! let store = Arc::new(FileChunkStore::new(CacheConfig::in_dir(&dir)));
//! let coordinator = Coordinator::new(store);
//!
//! let raw = "**FILE: src/lib.rs:10**\n```\nOLD:\nlet x = 1;\nNEW:\nlet x = 2;\n```";
//! let text = coordinator.process(raw, None, None, Some("bump x"));
//! assert!(text.contains("Replace this exact text"));
//!
//! // Later, in another request:
//! let again = coordinator.fetch("0badc0de", 2);
//! assert!(again.starts_with("Cache miss"));
//! ```
//!
//! ## Lower-level pieces
//!
//! ```rust
//! use editslabs::{chunk_edits, parse_edits, validate_edits};
//!
//! let edits = parse_edits("**FILE: a.rs:1**\n```\nOLD:\nfoo\nNEW:\nbar\n```");
//! assert!(validate_edits(&edits).valid);
//! let chunks = chunk_edits(&edits, 20_000);
//! assert_eq!(chunks[0].total_chunks, 1);
//! ```

mod cache;
mod capacity;
mod chunk;
mod coordinator;
mod edit;
mod error;
mod format;
mod parse;
mod validate;

pub use cache::{
    cache_key, is_valid_key, CacheConfig, CacheEntry, CacheStats, ChunkStore, Clock,
    FileChunkStore, ManualClock, MemoryChunkStore, SystemClock, DEFAULT_CACHE_DIR_NAME,
    DEFAULT_MAX_ENTRIES, DEFAULT_TTL,
};
pub use capacity::{ChunkCapacity, DEFAULT_MAX_CHARS};
pub use chunk::{chunk_edits, summarize_chunking, EditChunk, EditChunker};
pub use coordinator::{Coordinator, DEFAULT_SUMMARY_THRESHOLD, NO_EDITS_FOUND};
pub use edit::{EditRecord, EDIT_OVERHEAD_CHARS};
pub use error::{Error, Result};
pub use format::{format_response, summarize_edits, Pagination, FETCH_OPERATION};
pub use parse::{parse_edits, EditParser, Grammar};
pub use validate::{validate_edits, Validation};
