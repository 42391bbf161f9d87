//! The EditRecord type: one old-text to new-text replacement.

use serde::{Deserialize, Serialize};

/// Fixed overhead added to every record's size estimate.
///
/// Approximates the framing each edit picks up once it is rendered or serialized
/// (headers, fences, JSON keys).
pub const EDIT_OVERHEAD_CHARS: usize = 250;

/// A single atomic replacement tied to a file and line ranges.
///
/// Line numbers are 1-based and inclusive. An empty `old_code` is a pure insertion,
/// an empty `new_code` a pure deletion. Both empty is invalid (see
/// [`validate_edits`](crate::validate_edits)).
///
/// ```rust
/// use editslabs::EditRecord;
///
/// let edit = EditRecord::new("src/main.rs", 3..=3, "let x = 1;", 3..=3, "let x = 2;");
/// assert_eq!(edit.old_start_line, 3);
/// assert_eq!(edit.estimated_chars(), 250 + 2 * 11 + 10 + 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    /// Target file. Opaque; never checked against a filesystem.
    pub filename: String,
    /// First line the old text occupies.
    pub old_start_line: usize,
    /// Last line the old text occupies.
    pub old_end_line: usize,
    /// Exact text being replaced.
    pub old_code: String,
    /// First line the new text occupies.
    pub new_start_line: usize,
    /// Last line the new text occupies.
    pub new_end_line: usize,
    /// Replacement text.
    pub new_code: String,
}

impl EditRecord {
    /// Create a record from explicit line ranges.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        old_lines: std::ops::RangeInclusive<usize>,
        old_code: impl Into<String>,
        new_lines: std::ops::RangeInclusive<usize>,
        new_code: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            old_start_line: *old_lines.start(),
            old_end_line: *old_lines.end(),
            old_code: old_code.into(),
            new_start_line: *new_lines.start(),
            new_end_line: *new_lines.end(),
            new_code: new_code.into(),
        }
    }

    /// Estimated rendered size, used only for packing decisions.
    ///
    /// `250 + 2 * len(filename) + len(old_code) + len(new_code)`, where lengths are
    /// counted in UTF-16 code units to match what downstream transports count.
    #[must_use]
    pub fn estimated_chars(&self) -> usize {
        EDIT_OVERHEAD_CHARS
            + 2 * text_len(&self.filename)
            + text_len(&self.old_code)
            + text_len(&self.new_code)
    }

    /// Inclusive range of old lines.
    #[must_use]
    pub fn old_lines(&self) -> std::ops::RangeInclusive<usize> {
        self.old_start_line..=self.old_end_line
    }

    /// Inclusive range of new lines.
    #[must_use]
    pub fn new_lines(&self) -> std::ops::RangeInclusive<usize> {
        self.new_start_line..=self.new_end_line
    }
}

impl std::fmt::Display for EditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}-{} -> {}-{}]",
            self.filename,
            self.old_start_line,
            self.old_end_line,
            self.new_start_line,
            self.new_end_line
        )
    }
}

fn text_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_counts_filename_twice() {
        let edit = EditRecord::new("ab", 1..=1, "xyz", 1..=1, "");
        assert_eq!(edit.estimated_chars(), 250 + 4 + 3);
    }

    #[test]
    fn test_estimate_uses_utf16_units() {
        // 'é' is one unit, the emoji is a surrogate pair.
        let edit = EditRecord::new("f", 1..=1, "é", 1..=1, "😀");
        assert_eq!(edit.estimated_chars(), 250 + 2 + 1 + 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let edit = EditRecord::new("a.rs", 1..=2, "old", 1..=1, "new");
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["oldStartLine"], 1);
        assert_eq!(json["oldEndLine"], 2);
        assert_eq!(json["newCode"], "new");
    }

    #[test]
    fn test_display() {
        let edit = EditRecord::new("a.rs", 4..=6, "x", 4..=5, "y");
        assert_eq!(edit.to_string(), "a.rs [4-6 -> 4-5]");
    }
}
