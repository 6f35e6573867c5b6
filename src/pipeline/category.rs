//! Grouping of consecutive records by source file.
//!
//! In grouped mode every first match in a file is preceded by a synthetic
//! header item, and the per-record `path:line:col:` prefix is blanked out so
//! the display reads as an indented block under its header. Ordering and
//! record count are never altered.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::highlight::{grouped_word_span, header_span};
use crate::types::{HighlightGroups, MatchRecord, SearchItem};

static DISPLAY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^:]+:\d+:\d+:").unwrap_or_else(|e| panic!("display prefix regex: {e}"))
});

/// Per-invocation grouping state; the set of announced paths only grows.
pub(crate) struct Categorizer {
    seen: HashSet<String>,
    cwd: PathBuf,
    pattern_width: usize,
    groups: HighlightGroups,
}

impl Categorizer {
    pub(crate) fn new(cwd: PathBuf, pattern: &str, groups: HighlightGroups) -> Self {
        Self {
            seen: HashSet::new(),
            cwd,
            pattern_width: pattern.len(),
            groups,
        }
    }

    /// Expand one record into its grouped form, pushing a header first if
    /// the record's path has not been announced yet.
    pub(crate) fn expand(&mut self, mut record: MatchRecord, items: &mut Vec<SearchItem>) {
        if !record.path.is_empty() && !self.seen.contains(&record.path) {
            let display = format!("{}:", relative_to(&self.cwd, &record.path));
            let highlights = header_span(&self.groups, display.trim_end_matches(':'));
            items.push(SearchItem::FileHeader {
                path: record.path.clone(),
                display,
                highlights,
            });
            self.seen.insert(record.path.clone());
        }

        record.display = DISPLAY_PREFIX.replace(&record.display, " ").into_owned();
        record.highlights = grouped_word_span(&self.groups, record.col, self.pattern_width);
        items.push(SearchItem::Match(record));
    }
}

/// Path relative to the working directory, or the path itself when it lies
/// outside of it.
fn relative_to(cwd: &Path, path: &str) -> String {
    Path::new(path)
        .strip_prefix(cwd)
        .map_or_else(|_| path.to_string(), |rel| rel.to_string_lossy().into_owned())
}
