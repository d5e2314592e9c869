//! Scheduled Event Queue (C4)
//!
//! A priority queue keyed by `(scheduled_ts, sequence)`, implemented as a
//! binary heap the way a merge-by-timestamp queue is built throughout the
//! trading-systems corpus this crate draws on: push assigns a fresh global
//! sequence number, pop always returns the lexicographically smallest
//! `(scheduled_ts, sequence)` pair, so ties at the same timestamp resolve
//! to insertion (publish) order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::clock::Timestamp;
use crate::error::{BusError, BusResult};
use crate::event::EventEnvelope;

/// Per-(stream) ordering tiebreaker, assigned globally and monotonically at
/// publish time. Fixed as global-at-publish rather than per-stream — see
/// the crate's design notes on why this is the choice that preserves the
/// `CancelFairy` correctness argument.
///
/// Wrapped rather than a bare `u64` so the compiler rejects accidental
/// mixing with a [`crate::event::EventId`] or other integer-ish id in this
/// crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub const fn new(n: u64) -> Self {
        SequenceNumber(n)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> SequenceNumber {
    SequenceNumber::new(NEXT_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed))
}

#[cfg(test)]
pub(crate) fn reset_sequence_counter_for_test() {
    NEXT_SEQUENCE.store(0, AtomicOrdering::SeqCst);
}

/// A single entry in the scheduled event queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEntry {
    pub scheduled_ts: Timestamp,
    pub sequence: SequenceNumber,
    pub stream_id: String,
    pub topic: String,
    pub publisher_id: u64,
    pub event: EventEnvelope,
}

impl Eq for ScheduledEntry {}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.scheduled_ts, self.sequence).cmp(&(other.scheduled_ts, other.sequence))
    }
}

/// The dispatch core's scheduled event queue.
#[derive(Debug, Default)]
pub struct ScheduledEventQueue {
    heap: BinaryHeap<Reverse<ScheduledEntry>>,
}

impl ScheduledEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` after stamping it with a freshly assigned global
    /// sequence number (any `sequence` the caller set is overwritten, same
    /// as the teacher corpus's `push_timestamped`).
    pub fn push(
        &mut self,
        scheduled_ts: Timestamp,
        stream_id: impl Into<String>,
        topic: impl Into<String>,
        publisher_id: u64,
        event: EventEnvelope,
    ) -> SequenceNumber {
        let sequence = next_sequence();
        self.heap.push(Reverse(ScheduledEntry {
            scheduled_ts,
            sequence,
            stream_id: stream_id.into(),
            topic: topic.into(),
            publisher_id,
            event,
        }));
        sequence
    }

    /// Removes and returns the minimal `(scheduled_ts, sequence)` entry.
    pub fn pop_min(&mut self) -> BusResult<ScheduledEntry> {
        self.heap.pop().map(|Reverse(e)| e).ok_or(BusError::QueueEmpty)
    }

    /// Timestamp of the next entry to pop, without removing it. Used by
    /// the real-time pacer to compute how long to sleep.
    pub fn peek_min_ts(&self) -> Option<Timestamp> {
        self.heap.peek().map(|Reverse(e)| e.scheduled_ts)
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
