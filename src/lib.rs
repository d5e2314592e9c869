//! eventsim-core: a discrete-event trading simulator bus.
//!
//! A typed, topic-based publish/subscribe event bus and single-threaded
//! cooperative agent runtime: a logical clock and scheduled-event priority
//! queue drive a closed, compile-time-exhaustive set of trading events out
//! to registered agents in deterministic `(scheduled_ts, sequence)` order.

pub mod agent;
pub mod bus;
pub mod cancel_fairy;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod pacer;
pub mod queue;
pub mod scale;
pub mod subscription;
pub mod topic;

pub use agent::{Agent, AgentId, BusHandle, DeliveryContext, EventHandler};
pub use bus::Bus;
pub use cancel_fairy::CancelFairy;
pub use clock::{Duration, LogicalClock, Timestamp};
pub use collaborators::{ExchangeAdapter, L2Collector, TradingAlgorithm};
pub use config::BusConfig;
pub use error::{BusError, BusResult};
pub use event::{ClientOrderId, Event, EventEnvelope, EventId, ExchangeOrderId, PriceLevel, Side, Symbol};
pub use queue::{ScheduledEntry, ScheduledEventQueue, SequenceNumber};
pub use scale::{Price, Quantity};
