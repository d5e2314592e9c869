//! Error Handling Module
//!
//! Provides structured error types for the event bus and agent runtime.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! # Design Principles
//! 1. All errors are typed and descriptive.
//! 2. The bus never propagates a handler's error to another handler or to
//!    the dispatch caller — the only error surfaced by `step()`/`run()` is
//!    `QueueEmpty`. Handler faults are caught at the dispatch boundary,
//!    logged, and otherwise swallowed.
//! 3. No panics in the dispatch hot path.

use thiserror::Error;

use crate::clock::Timestamp;

/// Main error type for the event bus and agent runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// `step()`/`pop_min()` invoked with nothing queued. Recoverable: the
    /// caller may simply stop driving the loop.
    #[error("event queue is empty")]
    QueueEmpty,

    /// `deregister_entity` (or an unsubscribe) referenced an agent id that
    /// was never registered. Recoverable — log and ignore.
    #[error("unknown agent: {0}")]
    UnknownAgent(u64),

    /// `schedule_for_self_at` was given a target timestamp before `now`.
    /// Rejected outright; nothing is published.
    #[error("cannot schedule at {target} when now is {now}")]
    BadSchedule { now: Timestamp, target: Timestamp },

    /// `publish` was given no payload to carry.
    #[error("publish called with a null payload")]
    NullPayload,

    /// A handler raised an error or panicked during dispatch. Caught at the
    /// dispatch boundary and never propagated to other subscribers or to
    /// the caller of `step()`.
    #[error("handler fault in '{handler}' for event {event_id} delivered to agent {agent_id}: {reason}")]
    HandlerFault {
        handler: &'static str,
        event_id: u64,
        agent_id: u64,
        reason: String,
    },

    /// Surfaced by the inventory collaborator; caught at the agent-runtime
    /// dispatch boundary and logged with an inventory snapshot.
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },
}

/// Result alias used throughout the crate.
pub type BusResult<T> = Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(BusError::QueueEmpty.to_string(), "event queue is empty");
        assert_eq!(
            BusError::UnknownAgent(7).to_string(),
            "unknown agent: 7"
        );
    }
}
