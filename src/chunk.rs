//! File-aware greedy packing of edits into bounded chunks.
//!
//! ## The Algorithm
//!
//! ```text
//! 1. Group edits by filename (first-seen order, stable within a file)
//! 2. For each file group:
//!    - group fits the limit on its own?
//!        flush the open chunk if the group would overflow it, then append
//!        the whole group (files are never split when they could fit)
//!    - group alone exceeds the limit?
//!        flush the open chunk, then add edits one at a time, flushing
//!        whenever the next edit would overflow
//! 3. Flush what is left; number chunks 1..=N
//! ```
//!
//! A single edit is never fragmented. An edit larger than the limit lands alone in its
//! own chunk, which is the only way a chunk ends up over the limit.
//!
//! ## Ordering
//!
//! Concatenating the chunks preserves file-group order and within-file order. It can
//! differ from raw generation order when files interleave:
//!
//! ```text
//! input:  a1 b1 a2
//! chunks: [a1 a2 b1]
//! ```

use serde::{Deserialize, Serialize};

use crate::{ChunkCapacity, EditRecord};

/// A bounded, ordered subset of edits plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditChunk {
    /// The edits in delivery order.
    pub edits: Vec<EditRecord>,
    /// 1-based position among sibling chunks.
    pub chunk_index: usize,
    /// Number of sibling chunks.
    pub total_chunks: usize,
    /// True iff `chunk_index < total_chunks`.
    pub has_more: bool,
    /// Sum of [`EditRecord::estimated_chars`] over `edits`.
    pub estimated_chars: usize,
}

impl EditChunk {
    /// Number of edits in this chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether this chunk holds no edits (only the degenerate single chunk does).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl std::fmt::Display for EditChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EditChunk {{ {} of {}, edits: {}, est: {} }}",
            self.chunk_index,
            self.total_chunks,
            self.edits.len(),
            self.estimated_chars
        )
    }
}

/// Reusable chunker bound to a [`ChunkCapacity`].
///
/// ```rust
/// use editslabs::{EditChunker, EditRecord};
///
/// let edits = vec![
///     EditRecord::new("a.rs", 1..=1, "a", 1..=1, "A"),
///     EditRecord::new("b.rs", 1..=1, "b", 1..=1, "B"),
/// ];
/// let chunks = EditChunker::new(20_000).chunk(&edits);
/// assert_eq!(chunks.len(), 1);
/// assert!(!chunks[0].has_more);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EditChunker {
    capacity: ChunkCapacity,
}

impl EditChunker {
    /// Create a chunker with the given capacity.
    #[must_use]
    pub fn new(capacity: impl Into<ChunkCapacity>) -> Self {
        Self {
            capacity: capacity.into(),
        }
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> ChunkCapacity {
        self.capacity
    }

    /// Pack `edits` into chunks. Always returns at least one chunk.
    #[must_use]
    pub fn chunk(&self, edits: &[EditRecord]) -> Vec<EditChunk> {
        chunk_edits(edits, self.capacity)
    }
}

/// Open accumulator for the chunk currently being filled.
#[derive(Default)]
struct Pending {
    edits: Vec<EditRecord>,
    size: usize,
}

impl Pending {
    fn push(&mut self, edit: &EditRecord, size: usize) {
        self.edits.push(edit.clone());
        self.size += size;
    }

    fn flush_into(&mut self, done: &mut Vec<EditChunk>) {
        if self.edits.is_empty() {
            return;
        }
        let pending = std::mem::take(self);
        done.push(EditChunk {
            edits: pending.edits,
            chunk_index: done.len() + 1,
            total_chunks: 0,
            has_more: false,
            estimated_chars: pending.size,
        });
    }
}

/// Pack `edits` into chunks of at most `capacity` estimated characters.
///
/// An empty input yields exactly one empty chunk (`1 of 1`, no more).
#[must_use]
pub fn chunk_edits(edits: &[EditRecord], capacity: impl Into<ChunkCapacity>) -> Vec<EditChunk> {
    let capacity = capacity.into();

    if edits.is_empty() {
        return vec![EditChunk {
            edits: Vec::new(),
            chunk_index: 1,
            total_chunks: 1,
            has_more: false,
            estimated_chars: 0,
        }];
    }

    let mut chunks = Vec::new();
    let mut pending = Pending::default();

    for group in group_by_file(edits) {
        let sizes: Vec<usize> = group.iter().map(|e| e.estimated_chars()).collect();
        let group_size: usize = sizes.iter().sum();

        if capacity.exceeds(group_size) {
            pending.flush_into(&mut chunks);
            for (edit, size) in group.into_iter().zip(sizes) {
                if capacity.would_overflow(pending.size, size) {
                    pending.flush_into(&mut chunks);
                }
                pending.push(edit, size);
            }
        } else {
            if capacity.would_overflow(pending.size, group_size) {
                pending.flush_into(&mut chunks);
            }
            for (edit, size) in group.into_iter().zip(sizes) {
                pending.push(edit, size);
            }
        }
    }
    pending.flush_into(&mut chunks);

    let total = chunks.len();
    for chunk in &mut chunks {
        chunk.total_chunks = total;
        chunk.has_more = chunk.chunk_index < total;
    }
    chunks
}

/// Group edits by filename, preserving first-seen file order and within-file order.
fn group_by_file(edits: &[EditRecord]) -> Vec<Vec<&EditRecord>> {
    let mut slots: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    let mut groups: Vec<Vec<&EditRecord>> = Vec::new();

    for edit in edits {
        let slot = *slots.entry(edit.filename.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(edit);
    }
    groups
}

/// Human-readable breakdown of a chunk set.
///
/// ```text
/// Chunking Summary:
/// # edits: 12
/// # chunks: 2
/// est chars: 31,400
/// mean size: 15,700 chars
///
/// Chunks:
///   Chunk 1: 7 edits, ~19,800 chars
///   Chunk 2: 5 edits, ~11,600 chars
/// ```
#[must_use]
pub fn summarize_chunking(chunks: &[EditChunk]) -> String {
    let total_edits: usize = chunks.iter().map(EditChunk::len).sum();
    let total_chars: usize = chunks.iter().map(|c| c.estimated_chars).sum();
    let mean = if chunks.is_empty() {
        0
    } else {
        (total_chars + chunks.len() / 2) / chunks.len()
    };

    let lines: Vec<String> = chunks
        .iter()
        .map(|c| {
            format!(
                "  Chunk {}: {} edits, ~{} chars",
                c.chunk_index,
                c.len(),
                thousands(c.estimated_chars)
            )
        })
        .collect();

    format!(
        "Chunking Summary:\n# edits: {total_edits}\n# chunks: {}\nest chars: {}\nmean size: {} chars\n\nChunks:\n{}",
        chunks.len(),
        thousands(total_chars),
        thousands(mean),
        lines.join("\n")
    )
}

fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An edit whose estimate is exactly `size` (filename "f" + padding in `new_code`).
    fn sized(file: &str, size: usize) -> EditRecord {
        let base = 250 + 2 * file.len() + 1;
        EditRecord::new(file, 1..=1, "x", 1..=1, "y".repeat(size - base))
    }

    fn files(chunk: &EditChunk) -> Vec<&str> {
        chunk.edits.iter().map(|e| e.filename.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let chunks = chunk_edits(&[], 100);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
        assert_eq!(chunks[0].chunk_index, 1);
        assert_eq!(chunks[0].total_chunks, 1);
        assert!(!chunks[0].has_more);
        assert_eq!(chunks[0].estimated_chars, 0);
    }

    #[test]
    fn test_everything_fits() {
        let edits = [sized("a", 1000), sized("b", 1000), sized("a", 1000)];
        let chunks = chunk_edits(&edits, 20_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(files(&chunks[0]), ["a", "a", "b"]);
        assert_eq!(chunks[0].estimated_chars, 3000);
    }

    #[test]
    fn test_group_moves_whole_to_next_chunk() {
        let edits = [sized("a", 600), sized("b", 300), sized("b", 300)];
        let chunks = chunk_edits(&edits, 1000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(files(&chunks[0]), ["a"]);
        assert_eq!(files(&chunks[1]), ["b", "b"]);
    }

    #[test]
    fn test_oversized_group_split_per_edit() {
        let edits = [
            sized("a", 300),
            sized("big", 600),
            sized("big", 600),
            sized("big", 600),
            sized("c", 300),
        ];
        let chunks = chunk_edits(&edits, 1000);
        let layout: Vec<Vec<&str>> = chunks.iter().map(files).collect();
        assert_eq!(
            layout,
            vec![vec!["a"], vec!["big"], vec!["big"], vec!["big", "c"]]
        );
    }

    #[test]
    fn test_single_oversized_edit_alone() {
        let edits = [sized("a", 300), sized("huge", 5000), sized("b", 300)];
        let chunks = chunk_edits(&edits, 1000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(files(&chunks[1]), ["huge"]);
        assert_eq!(chunks[1].estimated_chars, 5000);
    }

    #[test]
    fn test_pagination_fields() {
        let edits: Vec<_> = (0..5).map(|i| sized(&format!("f{i}"), 900)).collect();
        let chunks = chunk_edits(&edits, 1000);
        assert_eq!(chunks.len(), 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i + 1);
            assert_eq!(chunk.total_chunks, 5);
            assert_eq!(chunk.has_more, i < 4);
        }
    }

    #[test]
    fn test_chunker_struct_matches_free_fn() {
        let edits = [sized("a", 700), sized("b", 700)];
        let chunker = EditChunker::new(1000);
        assert_eq!(chunker.capacity().max(), 1000);
        assert_eq!(chunker.chunk(&edits), chunk_edits(&edits, 1000));
    }

    #[test]
    fn test_summarize_chunking() {
        let edits = [sized("a", 12_000), sized("b", 9_000)];
        let summary = summarize_chunking(&chunk_edits(&edits, 20_000));
        assert!(summary.contains("# edits: 2"));
        assert!(summary.contains("# chunks: 2"));
        assert!(summary.contains("est chars: 21,000"));
        assert!(summary.contains("mean size: 10,500 chars"));
        assert!(summary.contains("  Chunk 1: 1 edits, ~12,000 chars"));
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
