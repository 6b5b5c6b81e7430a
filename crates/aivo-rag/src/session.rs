//! Bounded conversation history

use aivo_core::Exchange;
use std::collections::VecDeque;

/// Ordered, capacity-bounded list of past exchanges
///
/// Recording past capacity evicts the oldest exchange first.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    exchanges: VecDeque<Exchange>,
    capacity: usize,
}

impl ConversationSession {
    /// Create an empty session; a capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            exchanges: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a new exchange stamped with the current time
    pub fn record(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
        source_passages: Vec<String>,
    ) -> &Exchange {
        self.push(Exchange::new(query, response, source_passages))
    }

    /// Append an existing exchange
    pub fn push(&mut self, exchange: Exchange) -> &Exchange {
        self.exchanges.push_back(exchange);
        if self.exchanges.len() > self.capacity {
            if let Some(evicted) = self.exchanges.pop_front() {
                tracing::debug!(query = %evicted.query(), "Evicted oldest exchange");
            }
        }
        // Never empty right after a push.
        &self.exchanges[self.exchanges.len() - 1]
    }

    /// The last `n` exchanges, oldest first
    pub fn recent(&self, n: usize) -> Vec<&Exchange> {
        let skip = self.exchanges.len().saturating_sub(n);
        self.exchanges.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(session: &mut ConversationSession, count: usize) {
        for i in 1..=count {
            session.record(format!("q{i}"), format!("a{i}"), vec![format!("p{i}")]);
        }
    }

    fn queries(exchanges: &[&Exchange]) -> Vec<String> {
        exchanges.iter().map(|e| e.query().to_string()).collect()
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut session = ConversationSession::new(5);
        fill(&mut session, 3);

        assert_eq!(session.len(), 3);
        let all: Vec<_> = session.iter().collect();
        assert_eq!(queries(&all), vec!["q1", "q2", "q3"]);
        assert_eq!(all[2].passages(), &["p3".to_string()]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut session = ConversationSession::new(5);
        fill(&mut session, 6);

        assert_eq!(session.len(), 5);
        let all: Vec<_> = session.iter().collect();
        assert_eq!(queries(&all), vec!["q2", "q3", "q4", "q5", "q6"]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut session = ConversationSession::new(3);
        for i in 0..20 {
            session.record(format!("q{i}"), "a", vec![]);
            assert!(session.len() <= 3);
        }
    }

    #[test]
    fn test_recent_returns_last_in_chronological_order() {
        let mut session = ConversationSession::new(5);
        fill(&mut session, 5);

        assert_eq!(queries(&session.recent(2)), vec!["q4", "q5"]);
        assert_eq!(session.len(), 5);
    }

    #[test]
    fn test_recent_larger_than_len() {
        let mut session = ConversationSession::new(5);
        fill(&mut session, 1);

        assert_eq!(queries(&session.recent(2)), vec!["q1"]);
        assert!(ConversationSession::new(5).recent(2).is_empty());
    }

    #[test]
    fn test_record_returns_new_exchange() {
        let mut session = ConversationSession::new(1);
        fill(&mut session, 1);
        let latest = session.record("q2", "a2", vec![]);
        assert_eq!(latest.query(), "q2");
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut session = ConversationSession::new(0);
        assert_eq!(session.capacity(), 1);
        fill(&mut session, 2);
        assert_eq!(queries(&session.recent(5)), vec!["q2"]);
    }

    #[test]
    fn test_clear() {
        let mut session = ConversationSession::default();
        fill(&mut session, 2);
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.capacity(), 5);
    }
}
