//! Subscription Index (C3)
//!
//! Maps topics to the set of agents registered against them, plus the
//! reverse mapping needed for O(1) deregistration. The core requires only
//! literal topic matching — wildcard suffix interpretation (per-agent,
//! per-symbol) is a convention [`crate::topic`] builds on top, not a
//! feature of the index itself.

use std::collections::{HashMap, HashSet};

use crate::agent::AgentId;
use crate::error::{BusError, BusResult};

/// Topic → subscriber set, with the reverse agent → topic-set index kept
/// in lockstep so `remove_all` is O(subscriptions for that agent) rather
/// than O(all topics).
#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    by_topic: HashMap<String, HashSet<AgentId>>,
    by_agent: HashMap<AgentId, HashSet<String>>,
}

impl SubscriptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `agent_id` as a known subscriber-capable entity. Must be
    /// called before `subscribe`/`unsubscribe`/`remove_all` will treat the
    /// id as known; `deregister_entity` on an id that never went through
    /// here is an `UnknownAgent` error.
    pub fn register_agent(&mut self, agent_id: AgentId) {
        self.by_agent.entry(agent_id).or_default();
    }

    /// Idempotent: adding an already-present `(agent_id, topic)` pair is a
    /// no-op.
    pub fn subscribe(&mut self, agent_id: AgentId, topic: &str) {
        self.by_agent.entry(agent_id).or_default().insert(topic.to_string());
        self.by_topic.entry(topic.to_string()).or_default().insert(agent_id);
    }

    /// No-op if the pair is absent.
    pub fn unsubscribe(&mut self, agent_id: AgentId, topic: &str) {
        if let Some(topics) = self.by_agent.get_mut(&agent_id) {
            topics.remove(topic);
        }
        if let Some(agents) = self.by_topic.get_mut(topic) {
            agents.remove(&agent_id);
        }
    }

    /// All agents subscribed to the exact topic string. Order is
    /// unspecified but stable for the duration of one dispatch of a single
    /// event (no mutation happens mid-iteration in `Bus::step`).
    pub fn subscribers_of(&self, topic: &str) -> Vec<AgentId> {
        self.by_topic
            .get(topic)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Removes every subscription belonging to `agent_id`. Fails with
    /// `UnknownAgent` only if the agent was never registered at all.
    pub fn remove_all(&mut self, agent_id: AgentId) -> BusResult<()> {
        let topics = self
            .by_agent
            .remove(&agent_id)
            .ok_or(BusError::UnknownAgent(agent_id.as_u64()))?;
        for topic in topics {
            if let Some(agents) = self.by_topic.get_mut(&topic) {
                agents.remove(&agent_id);
            }
        }
        Ok(())
    }

    pub fn is_registered(&self, agent_id: AgentId) -> bool {
        self.by_agent.contains_key(&agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_is_idempotent() {
        let mut idx = SubscriptionIndex::new();
        let a = AgentId::new(1);
        idx.register_agent(a);
        idx.subscribe(a, "Bang");
        idx.subscribe(a, "Bang");
        assert_eq!(idx.subscribers_of("Bang"), vec![a]);
    }

    #[test]
    fn unsubscribe_absent_pair_is_noop() {
        let mut idx = SubscriptionIndex::new();
        let a = AgentId::new(1);
        idx.register_agent(a);
        idx.unsubscribe(a, "Bang");
        assert!(idx.subscribers_of("Bang").is_empty());
    }

    #[test]
    fn remove_all_drops_every_subscription() {
        let mut idx = SubscriptionIndex::new();
        let a = AgentId::new(1);
        idx.register_agent(a);
        idx.subscribe(a, "Bang");
        idx.subscribe(a, "TradeEvent");
        idx.remove_all(a).unwrap();
        assert!(idx.subscribers_of("Bang").is_empty());
        assert!(idx.subscribers_of("TradeEvent").is_empty());
        assert!(!idx.is_registered(a));
    }

    #[test]
    fn remove_all_unknown_agent_errors() {
        let mut idx = SubscriptionIndex::new();
        let result = idx.remove_all(AgentId::new(42));
        assert_eq!(result, Err(BusError::UnknownAgent(42)));
    }

    #[test]
    fn multiple_agents_fan_out() {
        let mut idx = SubscriptionIndex::new();
        let a = AgentId::new(1);
        let b = AgentId::new(2);
        idx.register_agent(a);
        idx.register_agent(b);
        idx.subscribe(a, "Bang");
        idx.subscribe(b, "Bang");
        let mut subs = idx.subscribers_of("Bang");
        subs.sort();
        assert_eq!(subs, vec![a, b]);
    }
}
