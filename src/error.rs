//! Error taxonomy for the search pipeline.
//!
//! Per-line parse failures are not represented here: they are recovered
//! locally by skipping the line. Only failures that prevent the stream from
//! producing results surface as `SearchError`.

/// Failure starting or driving a search invocation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The transliteration collaborator was missing or failed.
    #[error("query transform unavailable: {0}")]
    TransformUnavailable(#[source] anyhow::Error),

    /// The external tool could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A piped stream of the child process could not be captured.
    #[error("failed to capture {0} of search process")]
    Pipe(&'static str),
}
