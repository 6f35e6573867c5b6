//! Adaptive batch emission and the hard result-count ceiling.

use tokio::sync::mpsc;

use crate::types::{Batch, SearchItem};

/// First flush is small for fast perceived first-result latency.
pub(crate) const FIRST_BATCH_SIZE: usize = 1_000;
/// Later flushes favor throughput on large result sets.
pub(crate) const STEADY_BATCH_SIZE: usize = 100_000;

/// What the driving loop should do after a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushOutcome {
    Continue,
    /// The ceiling was reached; buffered items are already flushed and the
    /// process must be terminated without waiting for it to exit.
    CeilingReached,
    /// The consumer dropped its receiver; treat like cancellation.
    ConsumerGone,
}

/// Buffers items and releases them in batches on an adaptive schedule.
pub(crate) struct BatchEmitter {
    items: Vec<SearchItem>,
    threshold: usize,
    steady_threshold: usize,
    flushed_once: bool,
    /// Match records delivered or buffered so far; headers excluded.
    total_matches: usize,
    ceiling: usize,
    tx: mpsc::Sender<Batch>,
}

impl BatchEmitter {
    pub(crate) fn new(
        first_threshold: usize,
        steady_threshold: usize,
        ceiling: usize,
        tx: mpsc::Sender<Batch>,
    ) -> Self {
        Self {
            items: Vec::new(),
            threshold: first_threshold,
            steady_threshold,
            flushed_once: false,
            total_matches: 0,
            ceiling,
            tx,
        }
    }

    pub(crate) async fn push(&mut self, item: SearchItem) -> PushOutcome {
        if item.is_match() {
            self.total_matches += 1;
        }
        self.items.push(item);

        if self.total_matches >= self.ceiling {
            if !self.flush().await {
                return PushOutcome::ConsumerGone;
            }
            return PushOutcome::CeilingReached;
        }

        if self.items.len() >= self.threshold {
            if !self.flush().await {
                return PushOutcome::ConsumerGone;
            }
        }
        PushOutcome::Continue
    }

    /// Emit the buffered items, if any. Returns false when the consumer is
    /// gone.
    pub(crate) async fn flush(&mut self) -> bool {
        if self.items.is_empty() {
            return true;
        }
        let batch = std::mem::take(&mut self.items);
        if !self.flushed_once {
            self.flushed_once = true;
            self.threshold = self.steady_threshold;
        }
        self.tx.send(batch).await.is_ok()
    }
}
