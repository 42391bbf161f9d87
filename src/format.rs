//! Caller-facing rendering of edits and pagination.
//!
//! Output is plain text meant to be relayed verbatim to whoever applies the edits.
//! Multi-chunk responses end with literal continuation instructions so the caller can
//! fetch the next chunk without reconstructing any state.

use crate::EditRecord;

/// Name of the retrieval operation quoted in continuation instructions.
pub const FETCH_OPERATION: &str = "fetch-chunk";

/// Position of a chunk within its sibling set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based index of the chunk being rendered.
    pub current: usize,
    /// Number of chunks.
    pub total: usize,
    /// Cache key under which the remaining chunks can be fetched.
    pub cache_key: Option<String>,
}

impl Pagination {
    /// Pagination without a cache key.
    #[must_use]
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            cache_key: None,
        }
    }

    /// Attach a cache key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    fn is_multi(&self) -> bool {
        self.total > 1
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Render edits with a header, one block per edit, and a footer.
///
/// ```rust
/// use editslabs::{format_response, EditRecord, Pagination};
///
/// let edits = [EditRecord::new("a.rs", 1..=1, "old", 1..=1, "new")];
/// let text = format_response(&edits, Some(&Pagination::new(1, 3).with_key("0123abcd")));
/// assert!(text.contains("Chunk 1 of 3"));
/// assert!(text.contains(r#"fetch-chunk cacheKey="0123abcd" chunkIndex=2"#));
/// ```
#[must_use]
pub fn format_response(edits: &[EditRecord], pagination: Option<&Pagination>) -> String {
    let mut out = String::new();

    match pagination.filter(|p| p.is_multi()) {
        Some(p) => {
            out.push_str(&format!(
                "[EDIT OUTPUT - Chunk {} of {}]\n\n\
                 The generated edits are split across {} chunks.\n\
                 This chunk contains {} that can be applied independently.\n\n\
                 Each chunk contains self-contained edits grouped by file. You can safely apply these edits\n\
                 before fetching the next chunk.\n\n",
                p.current,
                p.total,
                p.total,
                plural(edits.len(), "complete edit"),
            ));
        }
        None => {
            out.push_str(&format!(
                "[EDIT OUTPUT - The files were analyzed and these edits were produced]\n\n\
                 There {} prepared for your codebase.\n\n\
                 IMPORTANT: Apply these edits directly WITHOUT reading the files first. \
                 The edits below contain exact text matches from the current file contents.\n\n",
                if edits.len() == 1 {
                    "is 1 modification".to_string()
                } else {
                    format!("are {} modifications", edits.len())
                },
            ));
        }
    }

    let blocks: Vec<String> = edits
        .iter()
        .enumerate()
        .map(|(i, edit)| {
            format!(
                "### Edit {}: {}\n\nReplace this exact text:\n```\n{}\n```\n\nWith this text:\n```\n{}\n```\n",
                i + 1,
                edit.filename,
                edit.old_code,
                edit.new_code
            )
        })
        .collect();
    out.push_str(&blocks.join("\n"));

    out.push_str(
        "\n---\nApply these edits in order. Each edit uses exact string matching, \
         so the old text must match exactly what appears between the code blocks.",
    );

    if let Some((p, key)) = pagination.and_then(|p| p.cache_key.as_deref().map(|k| (p, k))) {
        if p.current < p.total {
            let next = p.current + 1;
            let remaining = p.total - p.current;
            out.push_str(&format!(
                "\n\n---\n**Next Step**: After applying the edits above, retrieve the next chunk \
                 ({next} of {total}) using:\n\n\
                 ```\n{FETCH_OPERATION} cacheKey=\"{key}\" chunkIndex={next}\n```\n\n\
                 There {verb} {more} containing additional edits.\n\n\
                 **CONTINUE**: You are working on a multi-chunk edit response. After applying \
                 these edits, fetch the next chunk to continue with the remaining modifications.",
                total = p.total,
                verb = if remaining == 1 { "is" } else { "are" },
                more = plural(remaining, "more chunk"),
            ));
        }
    }

    out
}

/// Per-file edit counts and totals.
///
/// `partial` marks the summary as covering every chunk while only one is delivered.
///
/// ```rust
/// use editslabs::{summarize_edits, EditRecord};
///
/// let edits = [
///     EditRecord::new("a.rs", 1..=1, "x", 1..=1, "y"),
///     EditRecord::new("a.rs", 5..=5, "x", 5..=5, "y"),
///     EditRecord::new("b.rs", 1..=1, "x", 1..=1, "y"),
/// ];
/// let summary = summarize_edits(&edits, false);
/// assert!(summary.contains("Total edits: 3"));
/// assert!(summary.contains("- a.rs: 2 edits"));
/// assert!(summary.contains("- b.rs: 1 edit\n") || summary.ends_with("- b.rs: 1 edit"));
/// ```
#[must_use]
pub fn summarize_edits(edits: &[EditRecord], partial: bool) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for edit in edits {
        match counts.iter_mut().find(|(f, _)| *f == edit.filename) {
            Some((_, n)) => *n += 1,
            None => counts.push((edit.filename.as_str(), 1)),
        }
    }

    let table: Vec<String> = counts
        .iter()
        .map(|(file, n)| format!("- {file}: {}", plural(*n, "edit")))
        .collect();

    let (title, scope) = if partial {
        ("Edit Summary (Complete analysis across all chunks):", " (across all chunks)")
    } else {
        ("Edit Summary:", "")
    };

    format!(
        "{title}\nTotal edits: {}{scope}\nFiles affected: {}\n\n{}",
        edits.len(),
        counts.len(),
        table.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(file: &str) -> EditRecord {
        EditRecord::new(file, 2..=2, "before();", 2..=2, "after();")
    }

    #[test]
    fn test_single_shot_header() {
        let text = format_response(&[edit("a.rs")], None);
        assert!(text.starts_with("[EDIT OUTPUT - The files were analyzed"));
        assert!(text.contains("There is 1 modification prepared"));
        assert!(!text.contains("Chunk"));
        assert!(!text.contains(FETCH_OPERATION));
    }

    #[test]
    fn test_single_chunk_pagination_uses_single_shot_header() {
        let text = format_response(&[edit("a.rs"), edit("b.rs")], Some(&Pagination::new(1, 1)));
        assert!(text.contains("There are 2 modifications prepared"));
        assert!(!text.contains("Chunk 1 of 1"));
    }

    #[test]
    fn test_edit_blocks() {
        let text = format_response(&[edit("a.rs"), edit("b.rs")], None);
        assert!(text.contains("### Edit 1: a.rs\n\nReplace this exact text:\n```\nbefore();\n```"));
        assert!(text.contains("### Edit 2: b.rs"));
        assert!(text.contains("With this text:\n```\nafter();\n```"));
    }

    #[test]
    fn test_multi_chunk_continuation() {
        let p = Pagination::new(2, 4).with_key("deadbeef");
        let text = format_response(&[edit("a.rs")], Some(&p));
        assert!(text.starts_with("[EDIT OUTPUT - Chunk 2 of 4]"));
        assert!(text.contains("1 complete edit that"));
        assert!(text.contains("fetch-chunk cacheKey=\"deadbeef\" chunkIndex=3"));
        assert!(text.contains("There are 2 more chunks"));
    }

    #[test]
    fn test_second_to_last_chunk_says_is() {
        let p = Pagination::new(2, 3).with_key("deadbeef");
        let text = format_response(&[edit("a.rs")], Some(&p));
        assert!(text.contains("There is 1 more chunk containing"));
    }

    #[test]
    fn test_last_chunk_has_no_continuation() {
        let p = Pagination::new(3, 3).with_key("deadbeef");
        let text = format_response(&[edit("a.rs")], Some(&p));
        assert!(text.contains("Chunk 3 of 3"));
        assert!(!text.contains("Next Step"));
    }

    #[test]
    fn test_no_key_no_continuation() {
        let text = format_response(&[edit("a.rs")], Some(&Pagination::new(1, 3)));
        assert!(text.contains("Chunk 1 of 3"));
        assert!(!text.contains(FETCH_OPERATION));
    }

    #[test]
    fn test_summary_partial() {
        let edits = [edit("a.rs"), edit("b.rs"), edit("a.rs")];
        let summary = summarize_edits(&edits, true);
        assert!(summary.starts_with("Edit Summary (Complete analysis across all chunks):"));
        assert!(summary.contains("Total edits: 3 (across all chunks)"));
        assert!(summary.contains("Files affected: 2"));
        assert!(summary.ends_with("- a.rs: 2 edits\n- b.rs: 1 edit"));
    }
}
