//! Outbound message queue with single-flight flush scheduling.
//!
//! Any thread may enqueue. The first enqueue after a flush claims the
//! scheduling token and must schedule exactly one flush onto the
//! transport's I/O task; later enqueues ride along with that flush.
//!
//! ```text
//! enqueue ──► send ──────► claim token? ──yes──► schedule flush
//!                                 │
//!                                 no ──► pending flush drains it
//!
//! flush ──► release token ──► drain all ──► write batch ──► flush sink
//! ```
//!
//! Releasing the token before draining closes the race where an item is
//! pushed after the drain started: that enqueue wins a fresh claim and
//! schedules another flush.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};

// ============================================================================
// OutboundQueue
// ============================================================================

/// Unbounded lock-free FIFO of encoded messages awaiting transmission.
#[derive(Debug)]
pub struct OutboundQueue {
    /// Producer side, shared by every sending thread.
    tx: Sender<String>,
    /// Consumer side, drained by the I/O task.
    rx: Receiver<String>,
    /// Set while a flush is scheduled but has not started draining.
    scheduled: AtomicBool,
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            scheduled: AtomicBool::new(false),
        }
    }

    /// Appends an encoded message to the tail.
    ///
    /// Returns `true` if the caller claimed the scheduling token and must
    /// schedule a flush. A redundant claim is a no-op returning `false`.
    pub fn enqueue(&self, text: String) -> bool {
        // Both ends live in `self`, so the channel is never disconnected.
        let _ = self.tx.send(text);

        self.scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the scheduling token and takes every queued message.
    ///
    /// Called once at the start of each scheduled flush.
    pub fn begin_flush(&self) -> Vec<String> {
        self.scheduled.store(false, Ordering::Release);
        self.rx.try_iter().collect()
    }

    /// Drops every queued message, returning how many were discarded.
    pub fn discard(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Returns the number of queued messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Returns `true` if a flush is scheduled and not yet draining.
    #[inline]
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use proptest::prelude::*;

    #[test]
    fn test_first_enqueue_claims() {
        let queue = OutboundQueue::new();

        assert!(queue.enqueue("a".into()));
        assert!(!queue.enqueue("b".into()));
        assert!(!queue.enqueue("c".into()));
        assert!(queue.is_scheduled());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_flush_drains_everything_in_order() {
        let queue = OutboundQueue::new();
        queue.enqueue("a".into());
        queue.enqueue("b".into());

        let batch: Vec<_> = queue.begin_flush().into_iter().collect();
        assert_eq!(batch, vec!["a", "b"]);
        assert!(queue.is_empty());
        assert!(!queue.is_scheduled());
    }

    #[test]
    fn test_enqueue_after_flush_start_reclaims() {
        let queue = OutboundQueue::new();
        assert!(queue.enqueue("a".into()));

        let first = queue.begin_flush();
        assert_eq!(first.len(), 1);

        // Arrived while the first batch was being written.
        assert!(queue.enqueue("b".into()));

        let second: Vec<_> = queue.begin_flush().into_iter().collect();
        assert_eq!(second, vec!["b"]);
    }

    #[test]
    fn test_empty_flush_is_harmless() {
        let queue = OutboundQueue::new();
        assert!(queue.begin_flush().is_empty());
        assert!(queue.enqueue("a".into()));
    }

    #[test]
    fn test_discard() {
        let queue = OutboundQueue::new();
        queue.enqueue("a".into());
        queue.enqueue("b".into());

        assert_eq!(queue.discard(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_single_claim_per_caller_order() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 250;

        let queue = Arc::new(OutboundQueue::new());
        let claims = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let queue = Arc::clone(&queue);
                let claims = Arc::clone(&claims);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        if queue.enqueue(format!("{t}:{i}")) {
                            claims.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(claims.load(Ordering::SeqCst), 1);

        let batch = queue.begin_flush();
        assert_eq!(batch.len(), THREADS * PER_THREAD);

        let mut next = [0usize; THREADS];
        for entry in batch {
            let (t, i) = entry.split_once(':').unwrap();
            let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            assert_eq!(i, next[t], "thread {t} out of order");
            next[t] += 1;
        }
        assert!(next.iter().all(|&n| n == PER_THREAD));
    }

    #[test]
    fn test_enqueue_while_draining_loses_nothing() {
        const TOTAL: usize = 2_000;

        let queue = Arc::new(OutboundQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..TOTAL {
                    queue.enqueue(i.to_string());
                }
            })
        };

        let mut drained = Vec::with_capacity(TOTAL);
        while drained.len() < TOTAL {
            drained.extend(queue.begin_flush());
            thread::yield_now();
        }
        producer.join().unwrap();

        let expected: Vec<String> = (0..TOTAL).map(|i| i.to_string()).collect();
        assert_eq!(drained, expected);
        assert!(queue.is_empty());
    }

    proptest! {
        #[test]
        fn prop_drain_matches_enqueue_order(items in prop::collection::vec(".{0,16}", 1..64)) {
            let queue = OutboundQueue::new();

            let claims = items
                .iter()
                .filter(|item| queue.enqueue((*item).clone()))
                .count();
            prop_assert_eq!(claims, 1);

            let drained: Vec<String> = queue.begin_flush().into_iter().collect();
            prop_assert_eq!(drained, items);
            prop_assert!(queue.is_empty());
        }
    }
}
