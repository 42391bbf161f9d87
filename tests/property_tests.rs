//! Property-based tests for edit chunking.
//!
//! These tests verify that chunking maintains key invariants:
//! - Bounded: chunks stay under the limit unless a single file group or edit forces them over
//! - Complete: every edit lands in exactly one chunk
//! - Contiguous: a file whose edits fit the limit lives in one chunk
//! - Paginated: indices, totals and `has_more` agree

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use editslabs::{chunk_edits, EditChunk, EditRecord};

// =============================================================================
// Test Generators
// =============================================================================

/// Generate one edit for one of a handful of files, with a body large enough to
/// force splitting at small limits.
fn arbitrary_edit() -> impl Strategy<Value = EditRecord> {
    (
        prop::sample::select(vec!["a.rs", "b.rs", "src/c.rs", "docs/d.md", "e.toml"]),
        1usize..500,
        prop::string::string_regex("[a-z \n]{0,400}").unwrap(),
        prop::string::string_regex("[a-z \n]{1,400}").unwrap(),
    )
        .prop_map(|(file, line, old, new)| EditRecord::new(file, line..=line, old, line..=line, new))
}

/// Generate an edit list where every edit is tagged by its position, so duplicates and
/// drops are detectable.
fn arbitrary_edits() -> impl Strategy<Value = Vec<EditRecord>> {
    prop::collection::vec(arbitrary_edit(), 0..40).prop_map(|edits| {
        edits
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.new_code = format!("#{i}:{}", e.new_code);
                e
            })
            .collect()
    })
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn file_sizes(edits: &[EditRecord]) -> HashMap<&str, usize> {
    let mut sizes = HashMap::new();
    for e in edits {
        *sizes.entry(e.filename.as_str()).or_insert(0) += e.estimated_chars();
    }
    sizes
}

/// A chunk may exceed the limit only when it holds a single edit or part of a file
/// group that is itself over the limit.
fn chunk_within_bound(chunk: &EditChunk, limit: usize, sizes: &HashMap<&str, usize>) -> bool {
    if chunk.estimated_chars <= limit || chunk.edits.len() == 1 {
        return true;
    }
    let files: HashSet<&str> = chunk.edits.iter().map(|e| e.filename.as_str()).collect();
    files.iter().any(|f| sizes[f] > limit)
}

fn flattened(chunks: &[EditChunk]) -> Vec<EditRecord> {
    chunks.iter().flat_map(|c| c.edits.clone()).collect()
}

// =============================================================================
// Chunker Properties
// =============================================================================

proptest! {
    #[test]
    fn chunks_respect_bound(edits in arbitrary_edits(), limit in 300usize..3000) {
        let sizes = file_sizes(&edits);
        for chunk in chunk_edits(&edits, limit) {
            prop_assert!(
                chunk_within_bound(&chunk, limit, &sizes),
                "chunk {} is {} chars over limit {} with {} edits",
                chunk.chunk_index,
                chunk.estimated_chars,
                limit,
                chunk.edits.len()
            );
        }
    }

    #[test]
    fn chunks_are_complete(edits in arbitrary_edits(), limit in 300usize..3000) {
        let chunks = chunk_edits(&edits, limit);
        let mut got: Vec<String> = flattened(&chunks).into_iter().map(|e| e.new_code).collect();
        let mut want: Vec<String> = edits.iter().map(|e| e.new_code.clone()).collect();
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn fitting_files_stay_in_one_chunk(edits in arbitrary_edits(), limit in 300usize..3000) {
        let sizes = file_sizes(&edits);
        let chunks = chunk_edits(&edits, limit);
        for (file, size) in sizes {
            if size > limit {
                continue;
            }
            let holders = chunks
                .iter()
                .filter(|c| c.edits.iter().any(|e| e.filename == file))
                .count();
            prop_assert_eq!(holders, 1, "{} ({} chars) spread over {} chunks", file, size, holders);
        }
    }

    #[test]
    fn order_is_file_grouped_and_stable(edits in arbitrary_edits(), limit in 300usize..3000) {
        let out = flattened(&chunk_edits(&edits, limit));

        let mut file_order: Vec<&str> = Vec::new();
        for e in &edits {
            if !file_order.contains(&e.filename.as_str()) {
                file_order.push(&e.filename);
            }
        }
        let expected: Vec<&EditRecord> = file_order
            .iter()
            .flat_map(|f| edits.iter().filter(move |e| e.filename == *f))
            .collect();
        let out_refs: Vec<&EditRecord> = out.iter().collect();
        prop_assert_eq!(out_refs, expected);
    }

    #[test]
    fn pagination_is_consistent(edits in arbitrary_edits(), limit in 300usize..3000) {
        let chunks = chunk_edits(&edits, limit);
        let n = chunks.len();
        prop_assert!(n >= 1);
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_index, i + 1);
            prop_assert_eq!(chunk.total_chunks, n);
            prop_assert_eq!(chunk.has_more, i + 1 < n);
            let sum: usize = chunk.edits.iter().map(EditRecord::estimated_chars).sum();
            prop_assert_eq!(chunk.estimated_chars, sum);
        }
    }
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn empty_input_produces_single_empty_chunk() {
    let chunks = chunk_edits(&[], 20_000);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].edits.is_empty());
    assert_eq!(chunks[0].chunk_index, 1);
    assert_eq!(chunks[0].total_chunks, 1);
    assert!(!chunks[0].has_more);
}

#[test]
fn zero_limit_puts_every_edit_alone() {
    let edits: Vec<_> = (1..=4)
        .map(|i| EditRecord::new("a.rs", i..=i, "x", i..=i, "y"))
        .collect();
    let chunks = chunk_edits(&edits, 0);
    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|c| c.edits.len() == 1));
}

#[test]
fn interleaved_files_are_regrouped() {
    let edits = [
        EditRecord::new("a.rs", 1..=1, "a1", 1..=1, "A1"),
        EditRecord::new("b.rs", 1..=1, "b1", 1..=1, "B1"),
        EditRecord::new("a.rs", 9..=9, "a2", 9..=9, "A2"),
    ];
    let chunks = chunk_edits(&edits, 20_000);
    let order: Vec<_> = chunks[0].edits.iter().map(|e| e.old_code.as_str()).collect();
    assert_eq!(order, ["a1", "a2", "b1"]);
}

// =============================================================================
// Consistency Tests
// =============================================================================

#[test]
fn chunking_is_deterministic() {
    let edits: Vec<_> = (0..30)
        .map(|i| {
            EditRecord::new(
                format!("f{}.rs", i % 7),
                1..=1,
                "x".repeat(i * 37),
                1..=1,
                "y".repeat(i * 53),
            )
        })
        .collect();
    assert_eq!(chunk_edits(&edits, 2_500), chunk_edits(&edits, 2_500));
}
