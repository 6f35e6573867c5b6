//! Query resolution: literal patterns or transliterated input.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::SearchError;

/// How the raw input string becomes the search pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Use the input verbatim as the tool's pattern.
    #[default]
    Regex,
    /// Run the input through an injected [`QueryTransform`] first
    /// (e.g. a romaji-to-regex service).
    Transliterated,
}

/// External capability that rewrites raw input into a search pattern.
///
/// The pipeline awaits the transform once per invocation, before any
/// process is spawned.
pub trait QueryTransform: Send + Sync {
    fn transform<'a>(&'a self, input: &'a str) -> BoxFuture<'a, anyhow::Result<String>>;
}

/// Resolve the raw input into the pattern handed to the external tool.
///
/// # Errors
/// Returns [`SearchError::TransformUnavailable`] in transliterated mode when
/// no transform is configured or the collaborator fails.
pub(crate) async fn resolve_input(
    raw: &str,
    kind: InputKind,
    transform: Option<&Arc<dyn QueryTransform>>,
) -> Result<String, SearchError> {
    match kind {
        InputKind::Regex => Ok(raw.to_string()),
        InputKind::Transliterated => match transform {
            Some(transform) => transform
                .transform(raw)
                .await
                .map_err(SearchError::TransformUnavailable),
            None => Err(SearchError::TransformUnavailable(anyhow::anyhow!(
                "no query transform configured"
            ))),
        },
    }
}
