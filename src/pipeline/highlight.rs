//! Byte-offset highlight span computation.
//!
//! All offsets are 1-based UTF-8 byte positions within the record's display
//! text. `str::len()` already measures UTF-8 bytes, which keeps multi-byte
//! paths and patterns addressed the same way the consumer addresses its
//! display buffer.

use crate::types::{HighlightGroups, HighlightSpan, SpanField};

/// Spans for a full `path:line:col: text` display line.
///
/// `word_col`/`word_width` locate the matched region; they differ between
/// output formats because only the JSON format reports submatch boundaries.
pub(crate) fn record_spans(
    groups: &HighlightGroups,
    path: &str,
    line: u64,
    word_col: usize,
    word_width: usize,
) -> Vec<HighlightSpan> {
    vec![
        HighlightSpan {
            field: SpanField::Path,
            hl_group: groups.path.clone(),
            col: 1,
            width: path.len(),
        },
        HighlightSpan {
            field: SpanField::LineNr,
            hl_group: groups.line_nr.clone(),
            // Starts right after the separating colon.
            col: path.len() + 2,
            width: line.to_string().len(),
        },
        HighlightSpan {
            field: SpanField::Word,
            hl_group: groups.word.clone(),
            col: word_col,
            width: word_width,
        },
    ]
}

/// Single path span covering a grouped-mode file header.
pub(crate) fn header_span(groups: &HighlightGroups, display_path: &str) -> Vec<HighlightSpan> {
    vec![HighlightSpan {
        field: SpanField::Path,
        hl_group: groups.path.clone(),
        col: 1,
        width: display_path.len(),
    }]
}

/// Word-only span for a grouped-mode record whose path prefix was blanked.
pub(crate) fn grouped_word_span(
    groups: &HighlightGroups,
    col: u64,
    width: usize,
) -> Vec<HighlightSpan> {
    vec![HighlightSpan {
        field: SpanField::Word,
        hl_group: groups.word.clone(),
        // Offset past the blanked prefix's indent.
        col: col as usize + 2,
        width,
    }]
}
