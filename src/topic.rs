//! Topic string conventions.
//!
//! Topics are opaque strings to the bus — only subscribers assign meaning.
//! This module just centralizes the three conventions used throughout the
//! crate so callers don't hand-format `format!` strings at every call site.

use crate::agent::AgentId;

/// Global broadcast topic: the event class name alone, e.g. `"Bang"`.
pub fn global(event_class: &str) -> String {
    event_class.to_string()
}

/// Per-agent unicast topic: `EventClass.<agent_id>`.
pub fn unicast(event_class: &str, agent: AgentId) -> String {
    format!("{event_class}.{}", agent.as_u64())
}

/// Per-symbol multicast topic: `EventClass.<symbol>`.
pub fn multicast(event_class: &str, symbol: &str) -> String {
    format!("{event_class}.{symbol}")
}
