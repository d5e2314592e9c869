//! Dispatch Core (C5) and the bus's registration lifecycle.
//!
//! [`Bus`] owns the subscription index, the scheduled event queue, the
//! logical clock, and the registered agents. It is the single owner of all
//! bus-internal state — there is no internal locking, because exactly one
//! dispatch loop (this struct, driven from one thread) ever touches it.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, warn};

use crate::agent::{dispatch_event, Agent, AgentId, BusHandle, DeliveryContext};
use crate::clock::{LogicalClock, Timestamp};
use crate::error::{BusError, BusResult};
use crate::event::{Event, EventEnvelope};
use crate::queue::ScheduledEventQueue;
use crate::subscription::SubscriptionIndex;

/// The event bus and agent runtime.
pub struct Bus {
    clock: LogicalClock,
    subscriptions: SubscriptionIndex,
    queue: ScheduledEventQueue,
    agents: HashMap<AgentId, Box<dyn Agent>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(Timestamp::ZERO)
    }
}

impl Bus {
    /// Creates a bus whose logical clock starts at `origin` (default zero).
    pub fn new(origin: Timestamp) -> Self {
        Self {
            clock: LogicalClock::new(origin),
            subscriptions: SubscriptionIndex::new(),
            queue: ScheduledEventQueue::new(),
            agents: HashMap::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }

    /// Read-only access to the scheduled event queue, used by the real-time
    /// pacer to peek the next due timestamp without popping it.
    pub fn queue(&self) -> &ScheduledEventQueue {
        &self.queue
    }

    /// Registers `agent` under `agent_id`: stores the agent, then runs its
    /// `setup_subscriptions` with a scoped [`BusHandle`]. After this call
    /// returns, the agent is deliverable.
    pub fn register_entity(&mut self, agent_id: AgentId, mut agent: Box<dyn Agent>) {
        self.subscriptions.register_agent(agent_id);
        let now = self.clock.now();
        {
            let mut handle = BusHandle::new(agent_id, &mut self.subscriptions, &mut self.queue, now);
            agent.setup_subscriptions(&mut handle);
        }
        self.agents.insert(agent_id, agent);
    }

    /// Removes all of `agent_id`'s subscriptions and drops the agent.
    /// Further events addressed to it are simply never delivered, since the
    /// subscription index is what drives fan-out. Fails with
    /// `UnknownAgent` only if the id was never registered.
    pub fn deregister_entity(&mut self, agent_id: AgentId) -> BusResult<()> {
        self.subscriptions.remove_all(agent_id)?;
        self.agents.remove(&agent_id);
        Ok(())
    }

    /// Publishes `event` at the current logical time. Equivalent to the
    /// agent-facing `publish` but usable by external drivers (e.g. test
    /// harnesses, the real-time pacer's external-producer path) that are
    /// not themselves a registered agent.
    pub fn publish(&mut self, topic: impl Into<String>, event: Event, stream_id: impl Into<String>) {
        self.publish_at(self.clock.now(), topic, event, stream_id, AgentId::UNASSIGNED);
    }

    /// Publishes `event` to be dispatched at `scheduled_ts`, which may be in
    /// the future. Used internally by `BusHandle::schedule_for_self_at` and
    /// directly by external drivers seeding a scenario.
    pub fn publish_at(
        &mut self,
        scheduled_ts: Timestamp,
        topic: impl Into<String>,
        event: Event,
        stream_id: impl Into<String>,
        publisher_id: AgentId,
    ) {
        let envelope = EventEnvelope::new(event, self.clock.now());
        self.queue
            .push(scheduled_ts, stream_id, topic, publisher_id.as_u64(), envelope);
    }

    /// Pops the next scheduled entry, advances the clock to its timestamp,
    /// and fans it out to every current subscriber of its topic in stable
    /// order. Fails with `QueueEmpty` if there is nothing queued.
    pub fn step(&mut self) -> BusResult<()> {
        let entry = self.queue.pop_min()?;
        self.clock.advance_to(entry.scheduled_ts);
        let now = self.clock.now();

        let subscribers = self.subscriptions.subscribers_of(&entry.topic);
        let ctx = DeliveryContext {
            topic: entry.topic.clone(),
            publisher_id: AgentId::new(entry.publisher_id),
            now,
            stream_id: entry.stream_id.clone(),
            sequence: entry.sequence,
            event_id: entry.event.event_id,
        };

        for subscriber_id in subscribers {
            let Some(mut agent) = self.agents.remove(&subscriber_id) else {
                // Deregistered between subscribers_of() and delivery isn't
                // possible within a single step (nothing re-enters
                // subscription mutation mid-fan-out), but a defensive
                // check costs nothing.
                continue;
            };

            let payload = entry.event.payload.clone();
            let result = {
                let mut handle = BusHandle::new(subscriber_id, &mut self.subscriptions, &mut self.queue, now);
                catch_unwind(AssertUnwindSafe(|| {
                    dispatch_event(agent.as_mut(), &payload, &ctx, &mut handle);
                }))
            };

            if let Err(panic) = result {
                let reason = panic_message(&panic);
                let fault = BusError::HandlerFault {
                    handler: entry.event.payload.kind_name(),
                    event_id: entry.event.event_id.as_u64(),
                    agent_id: subscriber_id.as_u64(),
                    reason,
                };
                error!(
                    event_id = entry.event.event_id.as_u64(),
                    agent_id = subscriber_id.as_u64(),
                    handler = entry.event.payload.kind_name(),
                    "{fault}"
                );
            }

            self.agents.insert(subscriber_id, agent);
        }

        Ok(())
    }

    /// Repeats `step()` until the queue is empty or `max_steps` have run.
    /// Returns the number of steps actually executed.
    pub fn run(&mut self, max_steps: usize) -> usize {
        let mut executed = 0;
        while executed < max_steps {
            match self.step() {
                Ok(()) => executed += 1,
                Err(BusError::QueueEmpty) => break,
                Err(other) => {
                    warn!("bus.run: unexpected error from step(): {other}");
                    break;
                }
            }
        }
        executed
    }

    /// Runs until the queue drains or `max_steps` is exceeded. Unlike
    /// `run`, a `max_steps` overrun is silent by design — callers that
    /// care can compare the return value against their budget.
    pub fn run_until_quiescent(&mut self, max_steps: usize) -> usize {
        self.run(max_steps)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
