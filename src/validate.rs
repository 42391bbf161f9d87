//! Structural checks on parsed edits.

use crate::EditRecord;

/// Outcome of [`validate_edits`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// True iff `errors` is empty.
    pub valid: bool,
    /// One diagnostic per violated invariant, in record order.
    pub errors: Vec<String>,
}

/// Check every record and collect every violation.
///
/// Does not stop at the first failure. Checks: a filename is present, old and new line
/// ranges are not inverted, and the edit is not empty on both sides.
///
/// ```rust
/// use editslabs::{validate_edits, EditRecord};
///
/// let bad = EditRecord::new("a.rs", 5..=5, "", 5..=5, "");
/// let report = validate_edits(&[bad]);
/// assert!(!report.valid);
/// assert_eq!(report.errors, ["Empty edit for a.rs"]);
/// ```
#[must_use]
pub fn validate_edits(edits: &[EditRecord]) -> Validation {
    let mut errors = Vec::new();

    for edit in edits {
        if edit.filename.is_empty() {
            errors.push("Edit missing filename".to_string());
        }
        if edit.old_start_line > edit.old_end_line {
            errors.push(format!(
                "Invalid line range for {}: {} > {}",
                edit.filename, edit.old_start_line, edit.old_end_line
            ));
        }
        if edit.new_start_line > edit.new_end_line {
            errors.push(format!(
                "Invalid new line range for {}: {} > {}",
                edit.filename, edit.new_start_line, edit.new_end_line
            ));
        }
        if edit.old_code.is_empty() && edit.new_code.is_empty() {
            errors.push(format!("Empty edit for {}", edit.filename));
        }
    }

    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_edits() {
        let edits = [
            EditRecord::new("a.rs", 1..=2, "x\ny", 1..=1, "z"),
            EditRecord::new("b.rs", 3..=3, "", 3..=3, "inserted"),
        ];
        let report = validate_edits(&edits);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_collects_all_violations() {
        let edits = [
            EditRecord::new("", 1..=1, "x", 1..=1, "y"),
            EditRecord {
                old_start_line: 9,
                old_end_line: 3,
                new_start_line: 7,
                new_end_line: 2,
                ..EditRecord::new("b.rs", 1..=1, "", 1..=1, "")
            },
        ];
        let report = validate_edits(&edits);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            [
                "Edit missing filename",
                "Invalid line range for b.rs: 9 > 3",
                "Invalid new line range for b.rs: 7 > 2",
                "Empty edit for b.rs",
            ]
        );
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(validate_edits(&[]).valid);
    }
}
