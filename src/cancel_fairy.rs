//! Cancellation Supervisor Protocol (C8) — `CancelFairy`.
//!
//! Watches every acknowledged limit order for its timeout and, unless a
//! terminal event arrives first, fires a per-symbol expiration trigger. The
//! self-addressed check-then-trigger shape mirrors the teacher's
//! `risk.rs` timeout-supervisor pattern, generalized from a single
//! portfolio-level breach check to one scheduled probe per tracked order.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::agent::{Agent, AgentId, BusHandle, DeliveryContext, EventHandler};
use crate::clock::Duration;
use crate::event::{ExchangeOrderId, Symbol};
use crate::topic;

#[derive(Debug, Clone)]
struct TrackedOrder {
    symbol: Symbol,
    original_timeout: Duration,
}

/// Supervises every limit order it sees acknowledged and raises an
/// expiration trigger for any that outlive their quoted timeout without a
/// terminal event. Registered once per simulation, typically at a fixed,
/// well-known [`AgentId`].
#[derive(Debug, Default)]
pub struct CancelFairy {
    tracked: HashMap<ExchangeOrderId, TrackedOrder>,
}

impl CancelFairy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders currently being watched. Exposed for tests and
    /// diagnostics, not part of the event-driven protocol itself.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn untrack(&mut self, xid: ExchangeOrderId) {
        self.tracked.remove(&xid);
    }
}

impl EventHandler for CancelFairy {
    fn on_bang(&mut self, _ctx: &DeliveryContext, _bus: &mut BusHandle<'_>) {
        self.tracked.clear();
    }

    fn on_limit_order_ack(
        &mut self,
        xid: ExchangeOrderId,
        _cid: crate::event::ClientOrderId,
        symbol: &Symbol,
        timeout: Duration,
        _ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
        self.tracked.insert(
            xid,
            TrackedOrder {
                symbol: symbol.clone(),
                original_timeout: timeout,
            },
        );

        let target_ts = bus.get_current_time() + timeout;
        let self_topic = topic::unicast("CheckLimitOrderExpirationEvent", bus.get_id());
        let stream_id = format!("expire_check_{xid}");
        let event = crate::event::Event::CheckLimitOrderExpiration {
            target_xid: xid,
            original_timeout: timeout,
        };
        if bus
            .schedule_for_self_at(target_ts, self_topic, event, stream_id)
            .is_err()
        {
            debug!(xid, "CancelFairy: expiration probe rejected, timeout already elapsed");
        }
    }

    fn on_full_fill_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        _cid: crate::event::ClientOrderId,
        _symbol: &Symbol,
        _price: crate::scale::Price,
        _qty: crate::scale::Quantity,
        _ctx: &DeliveryContext,
        _bus: &mut BusHandle<'_>,
    ) {
        self.untrack(xid);
    }

    fn on_full_cancel_limit_order_ack(&mut self, xid: ExchangeOrderId, _ctx: &DeliveryContext, _bus: &mut BusHandle<'_>) {
        self.untrack(xid);
    }

    fn on_limit_order_expired(
        &mut self,
        xid: ExchangeOrderId,
        _cid: crate::event::ClientOrderId,
        _symbol: &Symbol,
        _ctx: &DeliveryContext,
        _bus: &mut BusHandle<'_>,
    ) {
        self.untrack(xid);
    }

    fn on_check_limit_order_expiration(
        &mut self,
        target_xid: ExchangeOrderId,
        _original_timeout: Duration,
        _ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
        let Some(order) = self.tracked.remove(&target_xid) else {
            trace!(xid = target_xid, "CancelFairy: expiration check fired for untracked or already-resolved order");
            return;
        };

        let symbol_topic = topic::multicast("TriggerExpiredLimitOrderEvent", &order.symbol);
        let event = crate::event::Event::TriggerExpiredLimitOrder {
            xid: target_xid,
            symbol: order.symbol,
        };
        bus.publish(symbol_topic, event, format!("expire_trigger_{target_xid}"));
    }

    fn on_ack_trigger_expired_limit_order(&mut self, xid: ExchangeOrderId, _ctx: &DeliveryContext, _bus: &mut BusHandle<'_>) {
        debug!(xid, "CancelFairy: expiration trigger acknowledged");
    }

    fn on_reject_trigger_expired_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        _ctx: &DeliveryContext,
        _bus: &mut BusHandle<'_>,
    ) {
        debug!(xid, reason, "CancelFairy: expiration trigger rejected");
    }
}

impl Agent for CancelFairy {
    fn setup_subscriptions(&mut self, bus: &mut BusHandle<'_>) {
        let self_id = bus.get_id();
        bus.subscribe(topic::global("Bang"));
        bus.subscribe(topic::global("LimitOrderAckEvent"));
        bus.subscribe(topic::global("FullFillLimitOrderEvent"));
        bus.subscribe(topic::global("FullCancelLimitOrderAckEvent"));
        bus.subscribe(topic::global("LimitOrderExpiredEvent"));
        bus.subscribe(topic::unicast("CheckLimitOrderExpirationEvent", self_id));
        bus.subscribe(topic::unicast("AckTriggerExpiredLimitOrderEvent", self_id));
        bus.subscribe(topic::unicast("RejectTriggerExpiredLimitOrderEvent", self_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::bus::Bus;
    use crate::clock::Timestamp;
    use crate::event::Event;
    use crate::scale::float_to_price;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FAIRY_ID: AgentId = AgentId::new(1);

    struct Watcher {
        triggers: Rc<RefCell<Vec<(ExchangeOrderId, Symbol)>>>,
    }

    impl EventHandler for Watcher {
        fn on_trigger_expired_limit_order(
            &mut self,
            xid: ExchangeOrderId,
            symbol: &Symbol,
            _ctx: &DeliveryContext,
            _bus: &mut BusHandle<'_>,
        ) {
            self.triggers.borrow_mut().push((xid, symbol.clone()));
        }
    }

    impl Agent for Watcher {
        fn setup_subscriptions(&mut self, bus: &mut BusHandle<'_>) {
            bus.subscribe(topic::multicast("TriggerExpiredLimitOrderEvent", "AAPL"));
        }
    }

    fn ack_event(xid: u64, timeout_us: i64) -> Event {
        Event::LimitOrderAck {
            xid,
            cid: 100,
            symbol: "AAPL".into(),
            timeout: Duration::from_micros(timeout_us),
        }
    }

    /// Scenario E1: an acknowledged order with no terminal event before its
    /// timeout elapses triggers exactly one expiration event.
    #[test]
    fn unfilled_order_expires_deterministically() {
        let mut bus = Bus::default();
        let triggers = Rc::new(RefCell::new(Vec::new()));
        bus.register_entity(FAIRY_ID, Box::new(CancelFairy::new()));
        bus.register_entity(
            AgentId::new(2),
            Box::new(Watcher {
                triggers: triggers.clone(),
            }),
        );

        bus.publish_at(
            Timestamp::from_micros(0),
            topic::global("LimitOrderAckEvent"),
            ack_event(42, 1_000),
            "acks",
            AgentId::UNASSIGNED,
        );
        bus.run(10);

        assert_eq!(*triggers.borrow(), vec![(42, "AAPL".to_string())]);
    }

    /// Scenario E2: a fill that arrives before the timeout check suppresses
    /// the expiration trigger entirely.
    #[test]
    fn fill_before_timeout_suppresses_expiration() {
        let mut bus = Bus::default();
        let triggers = Rc::new(RefCell::new(Vec::new()));
        bus.register_entity(FAIRY_ID, Box::new(CancelFairy::new()));
        bus.register_entity(
            AgentId::new(2),
            Box::new(Watcher {
                triggers: triggers.clone(),
            }),
        );

        bus.publish_at(
            Timestamp::from_micros(0),
            topic::global("LimitOrderAckEvent"),
            ack_event(42, 1_000),
            "acks",
            AgentId::UNASSIGNED,
        );
        bus.publish_at(
            Timestamp::from_micros(500),
            topic::global("FullFillLimitOrderEvent"),
            Event::FullFillLimitOrder {
                xid: 42,
                cid: 100,
                symbol: "AAPL".into(),
                price: float_to_price(100.0),
                qty: crate::scale::float_to_quantity(10.0),
            },
            "fills",
            AgentId::UNASSIGNED,
        );
        bus.run(10);

        assert!(triggers.borrow().is_empty());
    }

    #[test]
    fn bang_clears_all_tracked_orders() {
        let mut bus = Bus::default();
        bus.register_entity(FAIRY_ID, Box::new(CancelFairy::new()));

        bus.publish_at(
            Timestamp::from_micros(0),
            topic::global("LimitOrderAckEvent"),
            ack_event(7, 5_000),
            "acks",
            AgentId::UNASSIGNED,
        );
        bus.publish_at(Timestamp::from_micros(1), topic::global("Bang"), Event::Bang, "ctrl", AgentId::UNASSIGNED);
        bus.run(10);

        // Nothing left scheduled for xid 7's expiration check; run() drains
        // cleanly with no further events and no panics.
        assert_eq!(bus.queue_size(), 0);
    }
}
