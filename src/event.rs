//! Event taxonomy: the closed, compile-time set of payloads the bus can
//! carry, plus the globally monotonic event id assigned at construction.
//!
//! Every concrete event kind here must have a corresponding method on
//! [`crate::agent::EventHandler`] — the trait is the CRTP/tag-union
//! requirement's idiomatic-Rust equivalent: a compile-time guarantee that
//! every event type has a dispatch target on an agent, enforced by the
//! trait's (non-defaulted where it matters) method set and the exhaustive
//! `match` in [`crate::bus::Bus::dispatch_to`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::clock::{Duration, Timestamp};
use crate::scale::{Price, Quantity};

/// Client-assigned order id.
pub type ClientOrderId = u64;
/// Exchange-assigned order id.
pub type ExchangeOrderId = u64;
/// Ticker symbol. Opaque to the bus.
pub type Symbol = String;

/// Which side of the book an order/fill sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

/// A single price level in an [`Event::LTwoOrderBook`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// Globally unique, monotonically increasing event identifier, assigned at
/// construction. Wrapped rather than a bare `u64` so the compiler rejects
/// accidental mixing with a [`crate::queue::SequenceNumber`] or any other
/// integer-ish id in this crate — the two count different things and
/// happen to share a representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    pub const fn new(id: u64) -> Self {
        EventId(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Init at 1; a concurrent implementation would need an atomic increment,
/// but the runtime here is single-threaded cooperative so a plain counter
/// behind an `AtomicU64` is just defensive uniformity, not a concurrency
/// requirement.
static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    EventId::new(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Resets the global event id counter. Test-only: production code never
/// needs to rewind the id space mid-run.
#[cfg(test)]
pub(crate) fn reset_event_id_counter_for_test() {
    NEXT_EVENT_ID.store(1, Ordering::SeqCst);
}

/// The closed set of event kinds the bus can route. Every variant is an
/// immutable payload; the bus never mutates an event after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // ---- Control -----------------------------------------------------
    /// Global reset/clear pulse.
    Bang,

    // ---- Scheduling (self-addressed) ----------------------------------
    CheckLimitOrderExpiration {
        target_xid: ExchangeOrderId,
        original_timeout: Duration,
    },

    // ---- Market data ---------------------------------------------------
    LTwoOrderBook {
        symbol: Symbol,
        exchange_ts: Option<Timestamp>,
        ingress_ts: Timestamp,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    },
    Trade {
        symbol: Symbol,
        maker_cid: ClientOrderId,
        taker_cid: ClientOrderId,
        maker_xid: ExchangeOrderId,
        taker_xid: ExchangeOrderId,
        price: Price,
        qty: Quantity,
        maker_side: Side,
        maker_exhausted: bool,
    },

    // ---- Order requests -------------------------------------------------
    LimitOrder {
        cid: ClientOrderId,
        symbol: Symbol,
        side: Side,
        price: Price,
        qty: Quantity,
    },
    MarketOrder {
        cid: ClientOrderId,
        symbol: Symbol,
        side: Side,
        qty: Quantity,
    },
    PartialCancelLimitOrder {
        xid: ExchangeOrderId,
        qty: Quantity,
    },
    FullCancelLimitOrder {
        xid: ExchangeOrderId,
    },
    PartialCancelMarketOrder {
        xid: ExchangeOrderId,
        qty: Quantity,
    },
    FullCancelMarketOrder {
        xid: ExchangeOrderId,
    },

    // ---- Order responses ------------------------------------------------
    LimitOrderAck {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
        timeout: Duration,
    },
    MarketOrderAck {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
    },
    LimitOrderReject {
        cid: ClientOrderId,
        symbol: Symbol,
        reason: String,
    },
    MarketOrderReject {
        cid: ClientOrderId,
        symbol: Symbol,
        reason: String,
    },
    PartialFillLimitOrder {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
        price: Price,
        qty: Quantity,
    },
    FullFillLimitOrder {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
        price: Price,
        qty: Quantity,
    },
    PartialFillMarketOrder {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
        price: Price,
        qty: Quantity,
    },
    FullFillMarketOrder {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
        price: Price,
        qty: Quantity,
    },
    LimitOrderExpired {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
    },
    MarketOrderExpired {
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: Symbol,
    },
    PartialCancelLimitOrderAck {
        xid: ExchangeOrderId,
        qty: Quantity,
    },
    FullCancelLimitOrderAck {
        xid: ExchangeOrderId,
    },
    PartialCancelLimitOrderReject {
        xid: ExchangeOrderId,
        reason: String,
    },
    FullCancelLimitOrderReject {
        xid: ExchangeOrderId,
        reason: String,
    },
    PartialCancelMarketOrderAck {
        xid: ExchangeOrderId,
        qty: Quantity,
    },
    FullCancelMarketOrderAck {
        xid: ExchangeOrderId,
    },
    PartialCancelMarketOrderReject {
        xid: ExchangeOrderId,
        reason: String,
    },
    FullCancelMarketOrderReject {
        xid: ExchangeOrderId,
        reason: String,
    },

    // ---- Expiry workflow (CancelFairy) ----------------------------------
    TriggerExpiredLimitOrder {
        xid: ExchangeOrderId,
        symbol: Symbol,
    },
    AckTriggerExpiredLimitOrder {
        xid: ExchangeOrderId,
    },
    RejectTriggerExpiredLimitOrder {
        xid: ExchangeOrderId,
        reason: String,
    },
}

impl Event {
    /// Stable name of the concrete variant, used only for the default
    /// topic convention (`EventClass`, `EventClass.<suffix>`) and for log
    /// messages — never for dispatch, which is type-tag driven via `match`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Bang => "Bang",
            Event::CheckLimitOrderExpiration { .. } => "CheckLimitOrderExpirationEvent",
            Event::LTwoOrderBook { .. } => "LTwoOrderBookEvent",
            Event::Trade { .. } => "TradeEvent",
            Event::LimitOrder { .. } => "LimitOrderEvent",
            Event::MarketOrder { .. } => "MarketOrderEvent",
            Event::PartialCancelLimitOrder { .. } => "PartialCancelLimitOrderEvent",
            Event::FullCancelLimitOrder { .. } => "FullCancelLimitOrderEvent",
            Event::PartialCancelMarketOrder { .. } => "PartialCancelMarketOrderEvent",
            Event::FullCancelMarketOrder { .. } => "FullCancelMarketOrderEvent",
            Event::LimitOrderAck { .. } => "LimitOrderAckEvent",
            Event::MarketOrderAck { .. } => "MarketOrderAckEvent",
            Event::LimitOrderReject { .. } => "LimitOrderRejectEvent",
            Event::MarketOrderReject { .. } => "MarketOrderRejectEvent",
            Event::PartialFillLimitOrder { .. } => "PartialFillLimitOrderEvent",
            Event::FullFillLimitOrder { .. } => "FullFillLimitOrderEvent",
            Event::PartialFillMarketOrder { .. } => "PartialFillMarketOrderEvent",
            Event::FullFillMarketOrder { .. } => "FullFillMarketOrderEvent",
            Event::LimitOrderExpired { .. } => "LimitOrderExpiredEvent",
            Event::MarketOrderExpired { .. } => "MarketOrderExpiredEvent",
            Event::PartialCancelLimitOrderAck { .. } => "PartialCancelLimitOrderAckEvent",
            Event::FullCancelLimitOrderAck { .. } => "FullCancelLimitOrderAckEvent",
            Event::PartialCancelLimitOrderReject { .. } => "PartialCancelLimitOrderRejectEvent",
            Event::FullCancelLimitOrderReject { .. } => "FullCancelLimitOrderRejectEvent",
            Event::PartialCancelMarketOrderAck { .. } => "PartialCancelMarketOrderAckEvent",
            Event::FullCancelMarketOrderAck { .. } => "FullCancelMarketOrderAckEvent",
            Event::PartialCancelMarketOrderReject { .. } => "PartialCancelMarketOrderRejectEvent",
            Event::FullCancelMarketOrderReject { .. } => "FullCancelMarketOrderRejectEvent",
            Event::TriggerExpiredLimitOrder { .. } => "TriggerExpiredLimitOrderEvent",
            Event::AckTriggerExpiredLimitOrder { .. } => "AckTriggerExpiredLimitOrderEvent",
            Event::RejectTriggerExpiredLimitOrder { .. } => "RejectTriggerExpiredLimitOrderEvent",
        }
    }
}

/// An event together with the bookkeeping fields every payload carries:
/// a globally unique id and the timestamp at which it was constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub created_ts: Timestamp,
    pub payload: Event,
}

impl EventEnvelope {
    /// Wrap a payload, stamping it with a fresh event id and the given
    /// creation timestamp (normally "now" on the publishing agent's clock).
    pub fn new(payload: Event, created_ts: Timestamp) -> Self {
        Self {
            event_id: next_event_id(),
            created_ts,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ids_are_unique_and_increasing() {
        reset_event_id_counter_for_test();
        let a = EventEnvelope::new(Event::Bang, Timestamp::ZERO);
        let b = EventEnvelope::new(Event::Bang, Timestamp::ZERO);
        let c = EventEnvelope::new(Event::Bang, Timestamp::ZERO);
        assert!(a.event_id < b.event_id);
        assert!(b.event_id < c.event_id);
    }

    #[test]
    fn kind_name_matches_wire_taxonomy() {
        assert_eq!(Event::Bang.kind_name(), "Bang");
        assert_eq!(
            Event::TriggerExpiredLimitOrder {
                xid: 1,
                symbol: "X".into()
            }
            .kind_name(),
            "TriggerExpiredLimitOrderEvent"
        );
    }
}
