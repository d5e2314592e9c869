//! External Collaborator Contracts (C9).
//!
//! The bus never implements matching, strategy, or market-data-fan-out
//! logic itself — it only carries events between participants that do.
//! These traits name the three collaborator roles the wire taxonomy
//! assumes, the way the teacher's `gateway::Gateway` trait names the order-
//! execution role without committing to a simulated or live implementation.
//! Each extends [`Agent`] so a concrete collaborator both satisfies its role
//! contract and is directly registrable with a [`crate::bus::Bus`].

use crate::agent::Agent;

/// Consumes order-request topics (`LimitOrderEvent`, `MarketOrderEvent`,
/// the four cancel-request variants) and the trigger-expiration unicast
/// topic, producing the matching ack/reject/fill/expired/trade events. Plays
/// the role the distilled taxonomy calls the exchange adapter, conventionally
/// registered at [`crate::agent::AgentId::new(0)`] (wire convention; the bus
/// itself attaches no meaning to any particular id).
///
/// The contract is behavioral, not method-level: an implementer satisfies it
/// by overriding the relevant [`crate::agent::EventHandler`] methods, not by
/// implementing anything declared here. This trait exists so the crate's
/// public surface has a named type for "the thing that plays this role,"
/// mirroring how the teacher's `Gateway` trait names the execution role
/// without a `MatchOrder` method of its own appearing on `Gateway` directly.
pub trait ExchangeAdapter: Agent {}

/// Consumes book/trade market data and its own order-response topics,
/// producing order-request events. Plays the role the distilled taxonomy
/// calls the trading algorithm, registered at any `AgentId >= 1`.
pub trait TradingAlgorithm: Agent {}

/// Consumes `LTwoOrderBookEvent.<symbol>` for one or more symbols and
/// forwards snapshots through a user-provided callback. Never publishes —
/// a collector that calls `BusHandle::publish` is not fulfilling this
/// contract, it has become some other kind of agent.
pub trait L2Collector: Agent {}
