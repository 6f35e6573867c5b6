//! Core data types for the streaming search pipeline.

use serde::{Deserialize, Serialize};

/// Caller-supplied style tags for the three highlight regions.
///
/// The values are opaque to the pipeline and passed through on every
/// emitted span (e.g. editor highlight group names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightGroups {
    pub path: String,
    pub line_nr: String,
    pub word: String,
}

impl Default for HighlightGroups {
    fn default() -> Self {
        Self {
            path: "Normal".to_string(),
            line_nr: "Normal".to_string(),
            word: "Search".to_string(),
        }
    }
}

/// Which segment of a record's display text a span decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanField {
    Path,
    LineNr,
    Word,
}

/// A highlighted region within a record's display text.
///
/// `col` is 1-based and both `col` and `width` are UTF-8 byte units, never
/// code points, so they stay consistent with byte-addressed display buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub field: SpanField,
    pub hl_group: String,
    pub col: usize,
    pub width: usize,
}

/// One parsed search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Display text, `path:line:col: text` unless rewritten by grouping.
    pub display: String,
    /// Source path resolved against the invocation's working directory.
    pub path: String,
    /// 1-based line number.
    pub line: u64,
    /// 1-based column (`submatch.start + 1` in JSON format, as reported by
    /// `--column` in plain format).
    pub col: u64,
    /// The matched line's text with the line terminator stripped.
    pub text: String,
    pub highlights: Vec<HighlightSpan>,
}

/// A single element of an emitted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchItem {
    /// Synthetic header marking the start of a file's matches in grouped
    /// mode. Emitted at most once per distinct path, in first-seen order.
    FileHeader {
        path: String,
        display: String,
        highlights: Vec<HighlightSpan>,
    },
    Match(MatchRecord),
}

impl SearchItem {
    /// True for real match records; headers do not count toward the ceiling.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, SearchItem::Match(_))
    }
}

/// An ordered, non-empty group of items delivered atomically to the consumer.
pub type Batch = Vec<SearchItem>;
