//! # Write-Back Insert Buffering
//!
//! A small composed layer in front of each containment index: inserts
//! accumulate in a queue and are merged into the sorted per-permutation
//! lists in batches, amortizing the re-sort cost. Until a batch is flushed
//! its entries are not query-visible; a stale miss only costs a solver
//! re-run, never a wrong answer.

use std::sync::{Arc, Mutex};

/// A buffer of pending inserts with a flush threshold. With a threshold of
/// one every insert is written through immediately.
#[derive(Debug)]
pub(crate) struct InsertBuffer<E> {
    pending: Mutex<Vec<Arc<E>>>,
    threshold: usize,
}

impl<E> InsertBuffer<E> {
    pub(crate) fn new(threshold: usize) -> Self {
        InsertBuffer {
            pending: Mutex::new(Vec::new()),
            threshold: threshold.max(1),
        }
    }

    /// Queues an entry; returns true if the buffer reached its threshold
    /// and should be flushed
    pub(crate) fn push(&self, entry: Arc<E>) -> bool {
        let mut pending = self.pending.lock().expect("insert buffer lock poisoned");
        pending.push(entry);
        pending.len() >= self.threshold
    }

    /// Takes all pending entries out of the buffer
    pub(crate) fn drain(&self) -> Vec<Arc<E>> {
        let mut pending = self.pending.lock().expect("insert buffer lock poisoned");
        std::mem::take(&mut *pending)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.lock().expect("insert buffer lock poisoned").len()
    }
}
