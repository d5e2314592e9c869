//! End-to-end cancellation-supervisor scenarios.

use eventsim_core::agent::{Agent, AgentId, BusHandle, DeliveryContext, EventHandler};
use eventsim_core::bus::Bus;
use eventsim_core::cancel_fairy::CancelFairy;
use eventsim_core::clock::{Duration, Timestamp};
use eventsim_core::event::{Event, ExchangeOrderId, Symbol};
use eventsim_core::topic;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

const SUPERVISOR_ID: AgentId = AgentId::new(999);
const ADAPTER_ID: AgentId = AgentId::new(0);

#[derive(Default)]
struct StubAdapter;

impl EventHandler for StubAdapter {}

impl Agent for StubAdapter {
    fn setup_subscriptions(&mut self, _bus: &mut BusHandle<'_>) {}
}

struct TriggerRecorder {
    triggers: Rc<RefCell<Vec<(ExchangeOrderId, Symbol)>>>,
}

impl EventHandler for TriggerRecorder {
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

impl Agent for TriggerRecorder {
    fn setup_subscriptions(&mut self, bus: &mut BusHandle<'_>) {
        bus.subscribe(topic::multicast("TriggerExpiredLimitOrderEvent", "X"));
    }
}

fn ack_xid_7() -> Event {
    Event::LimitOrderAck {
        xid: 7,
        cid: 1,
        symbol: "X".into(),
        timeout: Duration::from_micros(100),
    }
}

/// E1: a tracked order with no terminal event before its timeout fires
/// exactly one trigger at `ack_ts + timeout`.
#[test]
fn deterministic_expiry_fires() {
    let mut bus = Bus::default();
    let triggers = Rc::new(RefCell::new(Vec::new()));

    bus.register_entity(SUPERVISOR_ID, Box::new(CancelFairy::new()));
    bus.register_entity(ADAPTER_ID, Box::new(StubAdapter));
    bus.register_entity(
        AgentId::new(42),
        Box::new(TriggerRecorder {
            triggers: triggers.clone(),
        }),
    );

    bus.publish_at(
        Timestamp::from_micros(0),
        topic::global("LimitOrderAckEvent"),
        ack_xid_7(),
        "acks",
        ADAPTER_ID,
    );
    bus.run_until_quiescent(100);

    assert_eq!(bus.now(), Timestamp::from_micros(100));
    assert_eq!(*triggers.borrow(), vec![(7, "X".to_string())]);
}

/// E2: a fill arriving before the timeout elapses suppresses the trigger
/// entirely.
#[test]
fn fill_suppresses_expiry() {
    let mut bus = Bus::default();
    let triggers = Rc::new(RefCell::new(Vec::new()));

    bus.register_entity(SUPERVISOR_ID, Box::new(CancelFairy::new()));
    bus.register_entity(ADAPTER_ID, Box::new(StubAdapter));
    bus.register_entity(
        AgentId::new(42),
        Box::new(TriggerRecorder {
            triggers: triggers.clone(),
        }),
    );

    bus.publish_at(
        Timestamp::from_micros(0),
        topic::global("LimitOrderAckEvent"),
        ack_xid_7(),
        "acks",
        ADAPTER_ID,
    );
    bus.publish_at(
        Timestamp::from_micros(40),
        topic::global("FullFillLimitOrderEvent"),
        Event::FullFillLimitOrder {
            xid: 7,
            cid: 1,
            symbol: "X".into(),
            price: eventsim_core::scale::float_to_price(100.0),
            qty: eventsim_core::scale::float_to_quantity(5.0),
        },
        "fills",
        ADAPTER_ID,
    );
    bus.run_until_quiescent(100);

    assert!(triggers.borrow().is_empty());
}

fn ack_event(xid: ExchangeOrderId, timeout_us: i64) -> Event {
    Event::LimitOrderAck {
        xid,
        cid: 1,
        symbol: "X".into(),
        timeout: Duration::from_micros(timeout_us),
    }
}

fn fill_event(xid: ExchangeOrderId) -> Event {
    Event::FullFillLimitOrder {
        xid,
        cid: 1,
        symbol: "X".into(),
        price: eventsim_core::scale::float_to_price(100.0),
        qty: eventsim_core::scale::float_to_quantity(5.0),
    }
}

proptest! {
    /// Invariants 4 & 5 (spec §8): for any interleaving of a
    /// `LimitOrderAckEvent(xid, timeout)` and a terminal fill, a terminal
    /// event scheduled at or before `ack_ts + timeout` suppresses the
    /// expiration trigger entirely; a terminal event scheduled strictly
    /// after it (or never) lets exactly one trigger fire at
    /// `ack_ts + timeout`.
    #[test]
    fn random_ack_and_terminal_interleaving_respects_expiry_invariant(
        timeout_us in 1i64..10_000,
        has_terminal in any::<bool>(),
        terminal_offset_us in 0i64..20_000,
    ) {
        let mut bus = Bus::default();
        let triggers = Rc::new(RefCell::new(Vec::new()));

        bus.register_entity(SUPERVISOR_ID, Box::new(CancelFairy::new()));
        bus.register_entity(ADAPTER_ID, Box::new(StubAdapter));
        bus.register_entity(
            AgentId::new(42),
            Box::new(TriggerRecorder { triggers: triggers.clone() }),
        );

        bus.publish_at(
            Timestamp::from_micros(0),
            topic::global("LimitOrderAckEvent"),
            ack_event(7, timeout_us),
            "acks",
            ADAPTER_ID,
        );

        if has_terminal {
            bus.publish_at(
                Timestamp::from_micros(terminal_offset_us),
                topic::global("FullFillLimitOrderEvent"),
                fill_event(7),
                "fills",
                ADAPTER_ID,
            );
        }

        bus.run_until_quiescent(10_000);

        // The terminal event is always published (test setup) before the
        // supervisor's self-scheduled check (which is only enqueued once
        // the ack is dispatched mid-run), so a terminal event at exactly
        // `ack_ts + timeout` wins the same-timestamp tie-break and still
        // suppresses the trigger.
        let suppressed = has_terminal && terminal_offset_us <= timeout_us;
        let expected = if suppressed { 0 } else { 1 };
        prop_assert_eq!(triggers.borrow().len(), expected);
    }
}
