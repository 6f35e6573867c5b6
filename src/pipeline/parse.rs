//! Line parsing for both output formats of the external tool.
//!
//! The format is fixed once per request: JSON-lines (`--json`) or
//! column-prefixed plain text. Lines that do not parse are skipped, never
//! fatal, so the process keeps streaming and the pipeline keeps consuming.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::highlight::record_spans;
use crate::request::OutputFormat;
use crate::types::{HighlightGroups, MatchRecord};

/// `path:line:col:text` where the path is everything up to the first colon
/// and the rest of the line may itself contain colons.
static PLAIN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:]+):(\d+):(\d+):(.*)$").unwrap_or_else(|e| panic!("plain line regex: {e}"))
});

/// Per-invocation line parser.
pub(crate) struct LineParser<'a> {
    format: OutputFormat,
    cwd: &'a Path,
    /// Resolved query pattern; the plain format has no submatch boundaries,
    /// so the word span width falls back to the pattern's byte length.
    pattern: &'a str,
    groups: &'a HighlightGroups,
}

impl<'a> LineParser<'a> {
    pub(crate) fn new(
        format: OutputFormat,
        cwd: &'a Path,
        pattern: &'a str,
        groups: &'a HighlightGroups,
    ) -> Self {
        Self {
            format,
            cwd,
            pattern,
            groups,
        }
    }

    /// Parse one raw output line into a match record, or `None` for lines
    /// carrying no match (non-match JSON records, malformed plain lines).
    pub(crate) fn parse(&self, line: &str) -> Option<MatchRecord> {
        match self.format {
            OutputFormat::Json => self.parse_json(line),
            OutputFormat::PlainText => self.parse_plain(line),
        }
    }

    fn parse_json(&self, line: &str) -> Option<MatchRecord> {
        let value: serde_json::Value = match serde_json::from_str(line.trim()) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("skipping unparseable json line: {e}");
                return None;
            }
        };
        // Summary/begin/end/context records carry no match.
        if value.get("type").and_then(|t| t.as_str()) != Some("match") {
            return None;
        }

        let data = value.get("data")?;
        let path = data.get("path")?.get("text")?.as_str()?;
        let line_nr = data.get("line_number")?.as_u64()?;
        let submatch = data.get("submatches")?.as_array()?.first()?;
        let start = submatch.get("start")?.as_u64()?;
        let end = submatch.get("end")?.as_u64()?;
        if end < start {
            log::debug!("skipping match with inverted submatch range: {line}");
            return None;
        }
        let text = trim_line_terminator(
            data.get("lines")
                .and_then(|l| l.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or(""),
        );

        // Display keeps the tool's 0-based byte offset; the record's column
        // is converted to 1-based for the consumer's jump action.
        let header = format!("{path}:{line_nr}:{start}: ");
        let highlights = record_spans(
            self.groups,
            path,
            line_nr,
            header.len() + start as usize + 1,
            (end - start) as usize,
        );

        Some(MatchRecord {
            display: format!("{header}{text}"),
            path: resolve_path(self.cwd, path),
            line: line_nr,
            col: start + 1,
            text: text.to_string(),
            highlights,
        })
    }

    fn parse_plain(&self, line: &str) -> Option<MatchRecord> {
        let Some(caps) = PLAIN_LINE.captures(line) else {
            // Should not occur with the canonical output flags; skipped
            // rather than treated as fatal.
            log::debug!("skipping non-matching plain line: {line}");
            return None;
        };

        let path = caps.get(1).map_or("", |m| m.as_str());
        let line_str = caps.get(2).map_or("", |m| m.as_str());
        let col_str = caps.get(3).map_or("", |m| m.as_str());
        let text = caps.get(4).map_or("", |m| m.as_str());
        let line_nr: u64 = line_str.parse().ok()?;
        let col: u64 = col_str.parse().ok()?;

        let header = format!("{path}:{line_nr}:{col}: ");
        // The header is rebuilt from the parsed integers, so its length is
        // the text segment's byte offset even when the raw fields carried
        // leading zeros.
        let highlights = record_spans(
            self.groups,
            path,
            line_nr,
            header.len() + col as usize,
            self.pattern.len(),
        );

        Some(MatchRecord {
            display: format!("{header}{text}"),
            path: resolve_path(self.cwd, path),
            line: line_nr,
            col,
            text: text.to_string(),
            highlights,
        })
    }
}

/// Join a tool-reported path against the working directory. Absolute paths
/// pass through unchanged; empty stays empty.
fn resolve_path(cwd: &Path, path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        cwd.join(path).to_string_lossy().into_owned()
    }
}

fn trim_line_terminator(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}
