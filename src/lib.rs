//! Streaming, batched, display-ready match records from a ripgrep-like
//! process.
//!
//! The pipeline spawns the external tool, consumes its stdout line by line,
//! parses each line into a [`MatchRecord`] (JSON-lines or column-prefixed
//! plain format), annotates it with UTF-8 byte-offset [`HighlightSpan`]s,
//! optionally groups records under per-file headers, and hands them to the
//! consumer in adaptively sized [`Batch`]es, all under a hard result-count
//! ceiling and cooperative cancellation.
//!
//! ```no_run
//! use rg_stream::{start_search, PipelineOptions, SearchRequest};
//!
//! # async fn demo() -> Result<(), rg_stream::SearchError> {
//! let request = SearchRequest {
//!     pattern: "TODO".to_string(),
//!     args: vec!["--column".into(), "--no-heading".into(), "--color".into(), "never".into()],
//!     globs: vec!["*.rs".into()],
//!     paths: vec![],
//!     cwd: std::env::current_dir().unwrap_or_default(),
//! };
//! let mut handle = start_search("rg", request, PipelineOptions::default(), None).await?;
//! while let Some(batch) = handle.next_batch().await {
//!     for item in batch {
//!         // render item
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod pipeline;
pub mod query;
pub mod request;
pub mod types;

pub use error::SearchError;
pub use pipeline::{start_search, PipelineOptions, SearchHandle};
pub use query::{InputKind, QueryTransform};
pub use request::{OutputFormat, SearchRequest};
pub use types::{Batch, HighlightGroups, HighlightSpan, MatchRecord, SearchItem, SpanField};
