//! Agent Runtime / Processor (C6)
//!
//! Every participant on the bus is a state object with a non-owning handle
//! back to the bus, valid only for the duration of a dispatch call or
//! `setup_subscriptions`. Dispatch is type-tag driven: [`EventHandler`] has
//! one method per concrete [`crate::event::Event`] variant, each defaulted
//! to a no-op, so an agent only overrides the kinds it cares about while
//! the compiler still guarantees every kind has *some* dispatch target.

use crate::clock::{Duration, Timestamp};
use crate::error::{BusError, BusResult};
use crate::event::{ClientOrderId, Event, EventId, ExchangeOrderId, PriceLevel, Side, Symbol};
use crate::queue::{ScheduledEventQueue, SequenceNumber};
use crate::scale::{Price, Quantity};
use crate::subscription::SubscriptionIndex;

/// Unique, non-negative agent identifier. `0` is reserved for "unassigned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(u64);

impl AgentId {
    pub const UNASSIGNED: AgentId = AgentId(0);

    pub const fn new(id: u64) -> Self {
        AgentId(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing the delivery a handler is currently reacting to:
/// the topic it arrived on, who published it, the bus's current logical
/// time, and the stream/sequence pair that ordered it.
#[derive(Debug, Clone)]
pub struct DeliveryContext {
    pub topic: String,
    pub publisher_id: AgentId,
    pub now: Timestamp,
    pub stream_id: String,
    pub sequence: SequenceNumber,
    pub event_id: EventId,
}

/// A non-owning handle into the bus, scoped to the duration of one
/// `setup_subscriptions` call or one handler invocation. Must not be
/// retained past that call — in particular, never past `deregister_entity`.
pub struct BusHandle<'a> {
    self_id: AgentId,
    subscriptions: &'a mut SubscriptionIndex,
    queue: &'a mut ScheduledEventQueue,
    now: Timestamp,
}

impl<'a> BusHandle<'a> {
    pub(crate) fn new(
        self_id: AgentId,
        subscriptions: &'a mut SubscriptionIndex,
        queue: &'a mut ScheduledEventQueue,
        now: Timestamp,
    ) -> Self {
        Self {
            self_id,
            subscriptions,
            queue,
            now,
        }
    }

    pub fn get_id(&self) -> AgentId {
        self.self_id
    }

    pub fn get_current_time(&self) -> Timestamp {
        self.now
    }

    /// Subscribes the owning agent to `topic`. Idempotent.
    pub fn subscribe(&mut self, topic: impl AsRef<str>) {
        self.subscriptions.subscribe(self.self_id, topic.as_ref());
    }

    /// Unsubscribes the owning agent from `topic`. No-op if not subscribed.
    pub fn unsubscribe(&mut self, topic: impl AsRef<str>) {
        self.subscriptions.unsubscribe(self.self_id, topic.as_ref());
    }

    /// Schedules `event` for delivery at the current logical time, on
    /// `stream_id`, addressed to `topic`.
    pub fn publish(&mut self, topic: impl Into<String>, event: Event, stream_id: impl Into<String>) {
        let envelope = crate::event::EventEnvelope::new(event, self.now);
        self.queue
            .push(self.now, stream_id, topic, self.self_id.as_u64(), envelope);
    }

    /// Schedules `event` for delivery at `target_ts`, which must be `>=`
    /// the current logical time or the call is rejected with
    /// `BadSchedule` and nothing is published.
    pub fn schedule_for_self_at(
        &mut self,
        target_ts: Timestamp,
        topic: impl Into<String>,
        event: Event,
        stream_id: impl Into<String>,
    ) -> BusResult<()> {
        if target_ts < self.now {
            return Err(BusError::BadSchedule {
                now: self.now,
                target: target_ts,
            });
        }
        let envelope = crate::event::EventEnvelope::new(event, self.now);
        self.queue
            .push(target_ts, stream_id, topic, self.self_id.as_u64(), envelope);
        Ok(())
    }
}

/// One method per concrete event kind, each defaulted to a no-op. An agent
/// overrides only the kinds it consumes; the bus dispatches by matching on
/// the payload's variant and calling the matching method — no string
/// comparison is involved in method selection, only in the prior topic
/// lookup.
#[allow(unused_variables)]
pub trait EventHandler {
    fn on_bang(&mut self, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_check_limit_order_expiration(
        &mut self,
        target_xid: ExchangeOrderId,
        original_timeout: Duration,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_l_two_order_book(
        &mut self,
        symbol: &Symbol,
        exchange_ts: Option<Timestamp>,
        ingress_ts: Timestamp,
        bids: &[PriceLevel],
        asks: &[PriceLevel],
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_trade(
        &mut self,
        symbol: &Symbol,
        maker_cid: ClientOrderId,
        taker_cid: ClientOrderId,
        maker_xid: ExchangeOrderId,
        taker_xid: ExchangeOrderId,
        price: Price,
        qty: Quantity,
        maker_side: Side,
        maker_exhausted: bool,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_limit_order(
        &mut self,
        cid: ClientOrderId,
        symbol: &Symbol,
        side: Side,
        price: Price,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_market_order(
        &mut self,
        cid: ClientOrderId,
        symbol: &Symbol,
        side: Side,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_partial_cancel_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_limit_order(&mut self, xid: ExchangeOrderId, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_partial_cancel_market_order(
        &mut self,
        xid: ExchangeOrderId,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_market_order(&mut self, xid: ExchangeOrderId, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_limit_order_ack(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        timeout: Duration,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_market_order_ack(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_limit_order_reject(
        &mut self,
        cid: ClientOrderId,
        symbol: &Symbol,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_market_order_reject(
        &mut self,
        cid: ClientOrderId,
        symbol: &Symbol,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_partial_fill_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        price: Price,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_fill_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        price: Price,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_partial_fill_market_order(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        price: Price,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_fill_market_order(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        price: Price,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_limit_order_expired(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_market_order_expired(
        &mut self,
        xid: ExchangeOrderId,
        cid: ClientOrderId,
        symbol: &Symbol,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_partial_cancel_limit_order_ack(
        &mut self,
        xid: ExchangeOrderId,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_limit_order_ack(&mut self, xid: ExchangeOrderId, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_partial_cancel_limit_order_reject(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_limit_order_reject(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_partial_cancel_market_order_ack(
        &mut self,
        xid: ExchangeOrderId,
        qty: Quantity,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_market_order_ack(&mut self, xid: ExchangeOrderId, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_partial_cancel_market_order_reject(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_full_cancel_market_order_reject(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_trigger_expired_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        symbol: &Symbol,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }

    fn on_ack_trigger_expired_limit_order(&mut self, xid: ExchangeOrderId, ctx: &DeliveryContext, bus: &mut BusHandle<'_>) {}

    fn on_reject_trigger_expired_limit_order(
        &mut self,
        xid: ExchangeOrderId,
        reason: &str,
        ctx: &DeliveryContext,
        bus: &mut BusHandle<'_>,
    ) {
    }
}

/// Registration lifecycle: construct with the desired id/config, register
/// with the bus (`register_entity`), have `setup_subscriptions` called
/// once, then handle deliveries until `deregister_entity`.
pub trait Agent: EventHandler {
    /// Subscribes to every topic this agent consumes. Called exactly once,
    /// immediately after `register_entity` installs the bus back-pointer.
    fn setup_subscriptions(&mut self, bus: &mut BusHandle<'_>);
}

/// Exhaustively dispatches `event` to `handler`'s matching typed method.
/// The single place in the crate where the closed event union and the
/// per-type handler table must agree — adding an `Event` variant without a
/// matching arm here is a compile error, which is exactly the
/// build-time-exhaustiveness guarantee the design calls for.
pub(crate) fn dispatch_event(
    handler: &mut dyn EventHandler,
    event: &Event,
    ctx: &DeliveryContext,
    bus: &mut BusHandle<'_>,
) {
    match event {
        Event::Bang => handler.on_bang(ctx, bus),
        Event::CheckLimitOrderExpiration {
            target_xid,
            original_timeout,
        } => handler.on_check_limit_order_expiration(*target_xid, *original_timeout, ctx, bus),
        Event::LTwoOrderBook {
            symbol,
            exchange_ts,
            ingress_ts,
            bids,
            asks,
        } => handler.on_l_two_order_book(symbol, *exchange_ts, *ingress_ts, bids, asks, ctx, bus),
        Event::Trade {
            symbol,
            maker_cid,
            taker_cid,
            maker_xid,
            taker_xid,
            price,
            qty,
            maker_side,
            maker_exhausted,
        } => handler.on_trade(
            symbol,
            *maker_cid,
            *taker_cid,
            *maker_xid,
            *taker_xid,
            *price,
            *qty,
            *maker_side,
            *maker_exhausted,
            ctx,
            bus,
        ),
        Event::LimitOrder {
            cid,
            symbol,
            side,
            price,
            qty,
        } => handler.on_limit_order(*cid, symbol, *side, *price, *qty, ctx, bus),
        Event::MarketOrder { cid, symbol, side, qty } => {
            handler.on_market_order(*cid, symbol, *side, *qty, ctx, bus)
        }
        Event::PartialCancelLimitOrder { xid, qty } => {
            handler.on_partial_cancel_limit_order(*xid, *qty, ctx, bus)
        }
        Event::FullCancelLimitOrder { xid } => handler.on_full_cancel_limit_order(*xid, ctx, bus),
        Event::PartialCancelMarketOrder { xid, qty } => {
            handler.on_partial_cancel_market_order(*xid, *qty, ctx, bus)
        }
        Event::FullCancelMarketOrder { xid } => handler.on_full_cancel_market_order(*xid, ctx, bus),
        Event::LimitOrderAck {
            xid,
            cid,
            symbol,
            timeout,
        } => handler.on_limit_order_ack(*xid, *cid, symbol, *timeout, ctx, bus),
        Event::MarketOrderAck { xid, cid, symbol } => handler.on_market_order_ack(*xid, *cid, symbol, ctx, bus),
        Event::LimitOrderReject { cid, symbol, reason } => {
            handler.on_limit_order_reject(*cid, symbol, reason, ctx, bus)
        }
        Event::MarketOrderReject { cid, symbol, reason } => {
            handler.on_market_order_reject(*cid, symbol, reason, ctx, bus)
        }
        Event::PartialFillLimitOrder {
            xid,
            cid,
            symbol,
            price,
            qty,
        } => handler.on_partial_fill_limit_order(*xid, *cid, symbol, *price, *qty, ctx, bus),
        Event::FullFillLimitOrder {
            xid,
            cid,
            symbol,
            price,
            qty,
        } => handler.on_full_fill_limit_order(*xid, *cid, symbol, *price, *qty, ctx, bus),
        Event::PartialFillMarketOrder {
            xid,
            cid,
            symbol,
            price,
            qty,
        } => handler.on_partial_fill_market_order(*xid, *cid, symbol, *price, *qty, ctx, bus),
        Event::FullFillMarketOrder {
            xid,
            cid,
            symbol,
            price,
            qty,
        } => handler.on_full_fill_market_order(*xid, *cid, symbol, *price, *qty, ctx, bus),
        Event::LimitOrderExpired { xid, cid, symbol } => {
            handler.on_limit_order_expired(*xid, *cid, symbol, ctx, bus)
        }
        Event::MarketOrderExpired { xid, cid, symbol } => {
            handler.on_market_order_expired(*xid, *cid, symbol, ctx, bus)
        }
        Event::PartialCancelLimitOrderAck { xid, qty } => {
            handler.on_partial_cancel_limit_order_ack(*xid, *qty, ctx, bus)
        }
        Event::FullCancelLimitOrderAck { xid } => handler.on_full_cancel_limit_order_ack(*xid, ctx, bus),
        Event::PartialCancelLimitOrderReject { xid, reason } => {
            handler.on_partial_cancel_limit_order_reject(*xid, reason, ctx, bus)
        }
        Event::FullCancelLimitOrderReject { xid, reason } => {
            handler.on_full_cancel_limit_order_reject(*xid, reason, ctx, bus)
        }
        Event::PartialCancelMarketOrderAck { xid, qty } => {
            handler.on_partial_cancel_market_order_ack(*xid, *qty, ctx, bus)
        }
        Event::FullCancelMarketOrderAck { xid } => handler.on_full_cancel_market_order_ack(*xid, ctx, bus),
        Event::PartialCancelMarketOrderReject { xid, reason } => {
            handler.on_partial_cancel_market_order_reject(*xid, reason, ctx, bus)
        }
        Event::FullCancelMarketOrderReject { xid, reason } => {
            handler.on_full_cancel_market_order_reject(*xid, reason, ctx, bus)
        }
        Event::TriggerExpiredLimitOrder { xid, symbol } => {
            handler.on_trigger_expired_limit_order(*xid, symbol, ctx, bus)
        }
        Event::AckTriggerExpiredLimitOrder { xid } => handler.on_ack_trigger_expired_limit_order(*xid, ctx, bus),
        Event::RejectTriggerExpiredLimitOrder { xid, reason } => {
            handler.on_reject_trigger_expired_limit_order(*xid, reason, ctx, bus)
        }
    }
}
