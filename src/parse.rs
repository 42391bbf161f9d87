//! Edit extraction from free-form generated text.
//!
//! Generation backends drift in how they format structured edits, so extraction is an
//! ordered list of grammars. The first grammar that yields anything wins; later grammars
//! are never consulted, which keeps overlapping matches from being counted twice.
//!
//! ## Fenced grammar (primary)
//!
//! ```text
//! **FILE: src/lib.rs:42**
//! ```
//! OLD:
//! fn old() {}
//! NEW:
//! fn new() {}
//! ```
//! ```
//!
//! Only the start line is given. End lines are derived from the line count of each
//! side after trailing whitespace is trimmed. Blank lines directly after a label are
//! skipped, and `\r\n` line endings are accepted.
//!
//! ## Marker grammar (fallback)
//!
//! ```text
//! /old/ * src/lib.rs 'start:' 42
//! fn old() {}
//! // 'end:' 42
//! \new\ * src/lib.rs 'start:' 42
//! fn new() {}
//! // 'end:' 42
//! ```
//!
//! Both sides carry explicit line numbers and a filename. Pairs whose filenames
//! disagree are skipped with a warning rather than failing the whole parse.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::EditRecord;

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\*\*FILE:\s*(.+?):(\d+)\*\*\s*\n```\s*\nOLD:(?:[ \t]*\r?\n)+(?:([\s\S]*?)\r?\n)??NEW:(?:[ \t]*\r?\n)+(?:([\s\S]*?)\r?\n)??```",
    )
    .expect("FENCED_RE regex should compile")
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"/old/ \* (.+?) 'start:' (\d+)\n([\s\S]*?)\n// 'end:' (\d+)\s*\n\s*\\new\\ \* (.+?) 'start:' (\d+)\n([\s\S]*?)\n// 'end:' (\d+)",
    )
    .expect("MARKER_RE regex should compile")
});

/// A textual edit format the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `**FILE: name:line**` header followed by a fenced `OLD:`/`NEW:` block.
    Fenced,
    /// `/old/ * name 'start:' n` ... `\new\ * name 'start:' n` marker pairs.
    Marker,
}

impl Grammar {
    /// Extract every record this grammar matches, in input order.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<EditRecord> {
        match self {
            Self::Fenced => FENCED_RE.captures_iter(text).filter_map(fenced_record).collect(),
            Self::Marker => MARKER_RE.captures_iter(text).filter_map(marker_record).collect(),
        }
    }
}

/// Tries grammars in priority order and keeps the first non-empty result.
///
/// ```rust
/// use editslabs::EditParser;
///
/// let text = "**FILE: a.rs:3**\n```\nOLD:\nlet x = 1;\nNEW:\nlet x = 2;\n```";
/// let edits = EditParser::default().parse(text);
/// assert_eq!(edits.len(), 1);
/// assert_eq!(edits[0].filename, "a.rs");
/// ```
#[derive(Debug, Clone)]
pub struct EditParser {
    grammars: Vec<Grammar>,
}

impl EditParser {
    /// Create a parser with a custom grammar order.
    #[must_use]
    pub fn new(grammars: &[Grammar]) -> Self {
        Self {
            grammars: grammars.to_vec(),
        }
    }

    /// Parse `text`. Never fails; returns an empty vec when nothing matches.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<EditRecord> {
        for grammar in &self.grammars {
            let edits = grammar.parse(text);
            if !edits.is_empty() {
                log::debug!("parsed {} edits with {:?} grammar", edits.len(), grammar);
                return edits;
            }
        }
        Vec::new()
    }
}

impl Default for EditParser {
    fn default() -> Self {
        Self::new(&[Grammar::Fenced, Grammar::Marker])
    }
}

/// Parse `text` with the default grammar order.
#[must_use]
pub fn parse_edits(text: &str) -> Vec<EditRecord> {
    EditParser::default().parse(text)
}

fn fenced_record(caps: Captures<'_>) -> Option<EditRecord> {
    let filename = caps[1].trim();
    let start = line_number(&caps[2], filename)?;
    let old_code = caps.get(3).map_or("", |m| m.as_str()).trim_end();
    let new_code = caps.get(4).map_or("", |m| m.as_str()).trim_end();

    Some(EditRecord {
        filename: filename.to_string(),
        old_start_line: start,
        old_end_line: start + line_count(old_code).saturating_sub(1),
        old_code: old_code.to_string(),
        new_start_line: start,
        new_end_line: start + line_count(new_code).saturating_sub(1),
        new_code: new_code.to_string(),
    })
}

fn marker_record(caps: Captures<'_>) -> Option<EditRecord> {
    let old_name = caps[1].trim();
    let new_name = caps[5].trim();
    if old_name != new_name {
        log::warn!("skipping edit with mismatched filenames: {old_name} vs {new_name}");
        return None;
    }

    Some(EditRecord {
        filename: old_name.to_string(),
        old_start_line: line_number(&caps[2], old_name)?,
        old_end_line: line_number(&caps[4], old_name)?,
        old_code: caps[3].trim_end().to_string(),
        new_start_line: line_number(&caps[6], old_name)?,
        new_end_line: line_number(&caps[8], old_name)?,
        new_code: caps[7].trim_end().to_string(),
    })
}

fn line_count(code: &str) -> usize {
    if code.is_empty() {
        0
    } else {
        code.split('\n').count()
    }
}

fn line_number(digits: &str, filename: &str) -> Option<usize> {
    match digits.parse() {
        Ok(n) => Some(n),
        Err(err) => {
            log::warn!("skipping edit for {filename}: bad line number {digits:?}: {err}");
            None
        }
    }
}
