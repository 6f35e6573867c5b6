//! Search request description and argv construction.

use std::path::PathBuf;

/// Output format of the external tool, detected once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `path:line:col:text` columns (`--column --no-heading`).
    PlainText,
    /// One JSON object per line (`--json`).
    Json,
}

/// Everything needed to invoke the external tool once.
///
/// Immutable after construction; `pattern` holds the raw caller input, which
/// is resolved through the query layer before argv construction.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Raw input string (pre-resolution).
    pub pattern: String,
    /// Extra flags passed verbatim to the tool, including the fixed output
    /// flags (e.g. `--column --no-heading --color never`).
    pub args: Vec<String>,
    /// Glob filters, expanded pairwise as `--glob <g>`.
    pub globs: Vec<String>,
    /// Target paths; empty means the working directory.
    pub paths: Vec<String>,
    /// Working directory for the process and for path resolution.
    pub cwd: PathBuf,
}

impl SearchRequest {
    /// Which line parser this request needs.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.args.iter().any(|a| a == "--json") {
            OutputFormat::Json
        } else {
            OutputFormat::PlainText
        }
    }

    /// Build the full argv for the external tool.
    ///
    /// The `--` separator always precedes the pattern so a pattern starting
    /// with `-` is never read as a flag.
    #[must_use]
    pub fn to_argv(&self, cmd: &str, pattern: &str) -> Vec<String> {
        let mut argv =
            Vec::with_capacity(2 + self.args.len() + self.globs.len() * 2 + self.paths.len() + 1);
        argv.push(cmd.to_string());
        argv.extend(self.args.iter().cloned());
        for glob in &self.globs {
            argv.push("--glob".to_string());
            argv.push(glob.clone());
        }
        argv.push("--".to_string());
        argv.push(pattern.to_string());
        argv.extend(self.paths.iter().cloned());
        argv
    }
}
