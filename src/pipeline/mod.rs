//! Streaming search pipeline over an external ripgrep-like process.
//!
//! One pipeline instance per invocation: it owns the process handle, the
//! cancellation channel, and all buffers, so concurrent invocations (e.g.
//! rapid live-typing triggers) never share mutable state. Records are
//! delivered in source-line order, in batches, until the stream ends, the
//! ceiling is reached, or the consumer cancels.

mod category;
mod emit;
mod highlight;
mod parse;
mod process;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::error::SearchError;
use crate::query::{self, InputKind, QueryTransform};
use crate::request::{OutputFormat, SearchRequest};
use crate::types::{Batch, HighlightGroups, SearchItem};

use category::Categorizer;
use emit::{BatchEmitter, PushOutcome, FIRST_BATCH_SIZE, STEADY_BATCH_SIZE};
use parse::LineParser;
use process::SearchProcess;

const BATCH_CHANNEL_CAPACITY: usize = 16;

/// Per-invocation knobs beyond the [`SearchRequest`] itself.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_kind: InputKind,
    /// Live, per-keystroke invocation. Gates short inputs and demotes
    /// transient pattern errors on stderr.
    pub volatile: bool,
    /// Minimum input length for volatile invocations; shorter inputs
    /// short-circuit with zero batches.
    pub min_volatile_input_len: usize,
    /// Group records under one synthetic header per source file.
    pub category: bool,
    /// Force every batch to a single item.
    pub one_item_batches: bool,
    /// Hard ceiling on delivered match records (headers excluded). Once
    /// reached the process is terminated without waiting for it to exit.
    pub max_items: usize,
    pub highlights: HighlightGroups,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input_kind: InputKind::Regex,
            volatile: false,
            min_volatile_input_len: 2,
            category: false,
            one_item_batches: false,
            max_items: 10_000,
            highlights: HighlightGroups::default(),
        }
    }
}

/// Consumer side of a running invocation.
#[derive(Debug)]
pub struct SearchHandle {
    batches: mpsc::Receiver<Batch>,
    cancel_tx: watch::Sender<bool>,
}

impl SearchHandle {
    /// Next batch, or `None` once the stream has closed cleanly.
    pub async fn next_batch(&mut self) -> Option<Batch> {
        self.batches.recv().await
    }

    /// Signal cancellation: the process is terminated and no further batch
    /// is emitted. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Start one search invocation.
///
/// `cmd` is the resolved executable path (resolution is the caller's
/// concern). An empty resolved query, or a volatile query shorter than the
/// configured minimum, returns a handle whose stream is already closed and
/// spawns no process.
///
/// # Errors
/// Returns [`SearchError::TransformUnavailable`] when the transliteration
/// collaborator is required but missing or failing, and
/// [`SearchError::Spawn`]/[`SearchError::Pipe`] when the process cannot be
/// started.
pub async fn start_search(
    cmd: &str,
    request: SearchRequest,
    options: PipelineOptions,
    transform: Option<Arc<dyn QueryTransform>>,
) -> Result<SearchHandle, SearchError> {
    let input = query::resolve_input(&request.pattern, options.input_kind, transform.as_ref())
        .await
        .inspect_err(|e| log::error!("query resolution failed: {e}"))?;

    let (cancel_tx, cancel_rx) = watch::channel(false);

    let too_short =
        options.volatile && input.chars().count() < options.min_volatile_input_len;
    if input.is_empty() || too_short {
        log::debug!("empty or too-short query, closing stream without spawning");
        let (_tx, batches) = mpsc::channel(1);
        return Ok(SearchHandle { batches, cancel_tx });
    }

    let format = request.output_format();
    let argv = request.to_argv(cmd, &input);
    // Fail fast on spawn errors so the caller sees them synchronously.
    let proc = SearchProcess::spawn(&argv, &request.cwd)?;

    let (tx, batches) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
    tokio::spawn(run_pipeline(
        proc,
        request.cwd,
        format,
        input,
        options,
        tx,
        cancel_rx,
    ));

    Ok(SearchHandle { batches, cancel_tx })
}

/// Why the driving loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    /// stdout reached end of stream.
    StreamEnd,
    /// Consumer cancelled or dropped the handle.
    Cancelled,
    /// The result ceiling was reached.
    Ceiling,
}

async fn run_pipeline(
    mut proc: SearchProcess,
    cwd: PathBuf,
    format: OutputFormat,
    pattern: String,
    options: PipelineOptions,
    tx: mpsc::Sender<Batch>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let parser = LineParser::new(format, &cwd, &pattern, &options.highlights);
    let mut categorizer = options
        .category
        .then(|| Categorizer::new(cwd.clone(), &pattern, options.highlights.clone()));

    let (first, steady) = if options.one_item_batches {
        (1, 1)
    } else {
        (FIRST_BATCH_SIZE, STEADY_BATCH_SIZE)
    };
    let mut emitter = BatchEmitter::new(first, steady, options.max_items, tx);

    let mut staged: Vec<SearchItem> = Vec::with_capacity(2);
    let mut shutdown = Shutdown::StreamEnd;

    'driving: loop {
        tokio::select! {
            // Err means the handle was dropped; stop emitting either way.
            _ = cancel_rx.changed() => {
                shutdown = Shutdown::Cancelled;
                break 'driving;
            }
            line = proc.stdout.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break 'driving,
                    Err(e) => {
                        log::error!("error reading search output: {e}");
                        break 'driving;
                    }
                };
                let Some(record) = parser.parse(&line) else {
                    continue;
                };
                match categorizer.as_mut() {
                    Some(cat) => cat.expand(record, &mut staged),
                    None => staged.push(SearchItem::Match(record)),
                }
                for item in staged.drain(..) {
                    // Stay responsive to cancellation while a full batch
                    // channel applies backpressure.
                    let outcome = tokio::select! {
                        _ = cancel_rx.changed() => PushOutcome::ConsumerGone,
                        outcome = emitter.push(item) => outcome,
                    };
                    match outcome {
                        PushOutcome::Continue => {}
                        PushOutcome::CeilingReached => {
                            shutdown = Shutdown::Ceiling;
                            break 'driving;
                        }
                        PushOutcome::ConsumerGone => {
                            shutdown = Shutdown::Cancelled;
                            break 'driving;
                        }
                    }
                }
            }
        }
    }
    staged.clear();

    match shutdown {
        // Final partial batch; the emitter already flushed on ceiling.
        Shutdown::StreamEnd => {
            emitter.flush().await;
        }
        // Signal first. Waiting for a graceful exit could deadlock on a
        // process still filling its stderr buffer.
        Shutdown::Cancelled | Shutdown::Ceiling => {
            proc.kill();
        }
    }

    // Two-phase shutdown: the process has been signaled (or has exited)
    // before the bounded stderr drain runs.
    proc.drain_stderr(options.volatile).await;
    proc.kill();
    if let Some(status) = proc.wait().await {
        if shutdown == Shutdown::StreamEnd && !status.success() {
            log::debug!("search process exited with {status}");
        }
    }
    // Dropping the emitter closes the batch channel: the clean
    // end-of-stream marker, delivered exactly once.
}
