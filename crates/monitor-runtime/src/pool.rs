//! The pool: pending trigger records awaiting a matching behaviour.

use std::collections::VecDeque;

use hpl_ast::{Bindings, Message};
use monitor_core::PoolPolicy;

/// A pending trigger, captured until a matching behaviour consumes it or it
/// ages out.
#[derive(Debug, Clone)]
pub struct TriggerRecord {
    /// Topic the trigger arrived on.
    pub topic: String,
    /// Timestamp the trigger fired at.
    pub timestamp: f64,
    /// The triggering message.
    pub message: Message,
    /// Bindings captured at the time of the trigger (e.g. the scope
    /// activator), consulted when testing a candidate behaviour.
    pub bindings: Bindings,
}

/// FIFO buffer of pending [`TriggerRecord`]s, bounded per [`PoolPolicy`].
#[derive(Debug, Default)]
pub struct Pool {
    policy: PoolPolicy,
    entries: VecDeque<TriggerRecord>,
}

impl Pool {
    /// An empty pool governed by `policy`.
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            policy,
            entries: VecDeque::new(),
        }
    }

    /// Record a new trigger, evicting the oldest entry (FIFO) if the pool
    /// is bounded and now over capacity. A [`PoolPolicy::None`] pool keeps
    /// only the single most recent trigger, replacing any prior one.
    pub fn push(&mut self, record: TriggerRecord) {
        match self.policy {
            PoolPolicy::None => {
                self.entries.clear();
                self.entries.push_back(record);
            }
            PoolPolicy::Bounded(k) => {
                self.entries.push_back(record);
                while self.entries.len() > k {
                    self.entries.pop_front();
                }
            }
            PoolPolicy::Unbounded => {
                self.entries.push_back(record);
            }
        }
    }

    /// Remove and return the oldest entry for which `matches` holds, if any.
    /// Used by requirement/response/prevention patterns that consume a
    /// pooled trigger once it is matched against a behaviour.
    pub fn take_matching<F>(&mut self, mut matches: F) -> Option<TriggerRecord>
    where
        F: FnMut(&TriggerRecord) -> bool,
    {
        let idx = self.entries.iter().position(|r| matches(r))?;
        self.entries.remove(idx)
    }

    /// Borrow the oldest entry for which `matches` holds, without removing
    /// it. Used by `pool_size = 0` requirement checks, which only test
    /// "has a qualifying trigger occurred" rather than consuming a specific
    /// record.
    pub fn peek_matching<F>(&self, mut matches: F) -> Option<&TriggerRecord>
    where
        F: FnMut(&TriggerRecord) -> bool,
    {
        self.entries.iter().find(|r| matches(r))
    }

    /// Drop entries older than `timeout` relative to `now`. Returns the
    /// number of entries removed.
    pub fn age_out(&mut self, now: f64, timeout: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| now - r.timestamp < timeout);
        before - self.entries.len()
    }

    /// Current number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries (done on a reentrant scope's exit and on launch).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(topic: &str, t: f64) -> TriggerRecord {
        TriggerRecord {
            topic: topic.to_string(),
            timestamp: t,
            message: Message::new(topic, json!({})),
            bindings: Bindings::new(),
        }
    }

    #[test]
    fn bounded_pool_evicts_fifo() {
        let mut pool = Pool::new(PoolPolicy::Bounded(1));
        pool.push(record("/a", 1.0));
        pool.push(record("/a", 2.0));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.peek_matching(|_| true).unwrap().timestamp, 2.0);
    }

    #[test]
    fn unbounded_pool_keeps_everything_until_aged_out() {
        let mut pool = Pool::new(PoolPolicy::Unbounded);
        pool.push(record("/a", 0.0));
        pool.push(record("/a", 1.0));
        pool.push(record("/a", 2.0));
        assert_eq!(pool.len(), 3);
        let removed = pool.age_out(3.5, 2.0);
        assert_eq!(removed, 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn take_matching_consumes_oldest_match() {
        let mut pool = Pool::new(PoolPolicy::Unbounded);
        pool.push(record("/a", 0.0));
        pool.push(record("/a", 1.0));
        let taken = pool.take_matching(|_| true).unwrap();
        assert_eq!(taken.timestamp, 0.0);
        assert_eq!(pool.len(), 1);
    }
}
