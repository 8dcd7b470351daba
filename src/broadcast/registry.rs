//! Subscriber registry
//!
//! The state shared by a broadcaster and its listeners. Every access goes
//! through the broadcaster's single lock.

use std::collections::HashMap;

use super::config::{BroadcasterConfig, IdPolicy};
use super::endpoint::{self, EndpointReceiver, EndpointSender};
use super::error::PushError;

/// Registry of subscriber endpoints
pub(super) struct Registry<T> {
    /// Attached endpoints keyed by subscriber id
    entries: HashMap<u64, EndpointSender<T>>,

    /// Endpoints removed by a discard, kept so close can still terminate them
    detached: Vec<EndpointSender<T>>,

    /// Next candidate id
    next_id: u64,

    /// Capacity applied to every new endpoint
    capacity: usize,

    id_policy: IdPolicy,

    /// Set once by close, never reset
    closed: bool,

    pub(super) label: String,
}

impl<T> Registry<T> {
    pub(super) fn new(config: &BroadcasterConfig) -> Self {
        Self {
            entries: HashMap::new(),
            detached: Vec::new(),
            next_id: 0,
            capacity: config.capacity,
            id_policy: config.id_policy,
            closed: false,
            label: config.label.clone(),
        }
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    fn allocate_id(&mut self) -> u64 {
        match self.id_policy {
            IdPolicy::ReuseOnCollision => {
                while self.entries.contains_key(&self.next_id) {
                    self.next_id += 1;
                }
                self.next_id
            }
            IdPolicy::Monotonic => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        }
    }

    /// Create and register a new endpoint
    ///
    /// After close the endpoint is still registered, but handed out already
    /// terminated.
    pub(super) fn register(&mut self) -> (u64, EndpointReceiver<T>) {
        self.prune_orphans();

        let (tx, rx) = endpoint::channel(self.capacity);
        let id = self.allocate_id();

        if self.closed {
            tx.close();
        }
        self.entries.insert(id, tx);

        (id, rx)
    }

    /// Remove the entry for `id` if it is the one feeding `receiver`
    ///
    /// Does not terminate the endpoint. Returns `true` if an entry was removed.
    pub(super) fn detach(&mut self, id: u64, receiver: &EndpointReceiver<T>) -> bool {
        if self.closed {
            return false;
        }

        match self.entries.get(&id) {
            Some(tx) if tx.feeds(receiver) => {}
            _ => return false,
        }

        if let Some(tx) = self.entries.remove(&id) {
            self.detached.push(tx);
        }
        true
    }

    /// Terminate every endpoint, attached or detached
    ///
    /// Returns `false` if the registry was already closed.
    pub(super) fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        for tx in self.entries.values().chain(self.detached.iter()) {
            tx.close();
        }
        // Detached listeners have seen their end-of-stream; nothing else refers to them
        self.detached.clear();

        true
    }

    /// Drop endpoints whose listener has gone away
    ///
    /// Returns the number of attached entries removed.
    pub(super) fn prune_orphans(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, tx| !tx.is_orphaned());
        self.detached.retain(|tx| !tx.is_orphaned());
        before - self.entries.len()
    }

    pub(super) fn stats(&self) -> BroadcasterStats {
        BroadcasterStats {
            subscribers: self.entries.len(),
            detached: self.detached.len(),
            closed: self.closed,
            capacity: self.capacity,
            next_id: self.next_id,
        }
    }
}

impl<T: Clone> Registry<T> {
    /// Push `value` into every attached endpoint, one after another
    ///
    /// Waits on each full endpoint in turn. Returns the number of endpoints
    /// that accepted the value; orphaned entries are pruned afterwards.
    pub(super) async fn deliver(&mut self, value: T) -> usize {
        let mut delivered = 0;
        let mut orphaned = Vec::new();

        for (&id, tx) in self.entries.iter() {
            match tx.push(value.clone()).await {
                Ok(()) => delivered += 1,
                Err(PushError::Orphaned(_)) => orphaned.push(id),
                // Attached endpoints are only terminated together with the registry
                Err(PushError::Closed(_)) => {}
            }
        }

        if !orphaned.is_empty() {
            for id in &orphaned {
                self.entries.remove(id);
            }
            tracing::debug!(
                broadcast = %self.label,
                pruned = orphaned.len(),
                "Dropped listeners pruned"
            );
        }

        delivered
    }
}

impl<T> Drop for Registry<T> {
    fn drop(&mut self) {
        // No producer is left; let listeners observe end-of-stream
        for tx in self.entries.values().chain(self.detached.iter()) {
            tx.close();
        }
    }
}

/// Snapshot of a broadcaster's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcasterStats {
    /// Number of registered endpoints (kept after close)
    pub subscribers: usize,
    /// Number of discarded endpoints still awaiting close
    pub detached: usize,
    /// Whether the broadcaster has been closed
    pub closed: bool,
    /// Per-subscriber buffer capacity
    pub capacity: usize,
    /// Next candidate subscriber id
    pub next_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::error::TryRecvError;

    fn registry(policy: IdPolicy) -> Registry<u32> {
        Registry::new(&BroadcasterConfig::default().capacity(1).id_policy(policy))
    }

    #[test]
    fn test_ids_advance_on_collision() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (a, _rx_a) = reg.register();
        let (b, _rx_b) = reg.register();
        let (c, _rx_c) = reg.register();

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_freed_id_is_reused() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (_, _rx0) = reg.register();
        let (id1, rx1) = reg.register();
        assert_eq!(id1, 1);

        // next_id still points at the freed id
        assert!(reg.detach(id1, &rx1));
        let (reused, _rx) = reg.register();
        assert_eq!(reused, 1);
    }

    #[test]
    fn test_freed_lower_id_is_skipped() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (id0, rx0) = reg.register();
        let (_, _rx1) = reg.register();
        assert!(reg.detach(id0, &rx0));

        let (id, _rx) = reg.register();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_monotonic_never_reuses() {
        let mut reg = registry(IdPolicy::Monotonic);

        let (_, _rx0) = reg.register();
        let (id1, rx1) = reg.register();
        assert!(reg.detach(id1, &rx1));

        let (id, _rx) = reg.register();
        assert_eq!(id, 2);
        assert_eq!(reg.stats().next_id, 3);
    }

    #[test]
    fn test_detach_requires_matching_endpoint() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (_, _rx0) = reg.register();
        let (id, old_rx) = reg.register();
        assert!(reg.detach(id, &old_rx));

        // Same id now belongs to someone else
        let (reused, _new_rx) = reg.register();
        assert_eq!(reused, id);
        assert!(!reg.detach(id, &old_rx));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_register_after_close_is_terminated() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);
        assert!(reg.close());
        assert!(!reg.close());

        let (_, mut rx) = reg.register();
        assert!(rx.is_terminated());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_close_terminates_detached() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (id, rx) = reg.register();
        assert!(reg.detach(id, &rx));
        assert!(!rx.is_terminated());
        assert_eq!(reg.stats().detached, 1);

        reg.close();
        assert!(rx.is_terminated());
        assert_eq!(reg.stats().detached, 0);
    }

    #[test]
    fn test_close_keeps_entries() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);
        let (id, rx) = reg.register();

        reg.close();
        assert!(!reg.detach(id, &rx));

        let stats = reg.stats();
        assert!(stats.closed);
        assert_eq!(stats.subscribers, 1);
    }

    #[test]
    fn test_prune_orphans() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        let (_, rx0) = reg.register();
        let (_, _rx1) = reg.register();
        drop(rx0);

        assert_eq!(reg.prune_orphans(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_prunes_dropped_listeners() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);

        for _ in 0..100 {
            let (_, rx) = reg.register();
            drop(rx);
        }
        assert_eq!(reg.len(), 1);

        let (_, _kept) = reg.register();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_drop_terminates_endpoints() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);
        let (_, rx) = reg.register();

        drop(reg);
        assert!(rx.is_terminated());
    }

    #[tokio::test]
    async fn test_deliver_to_all() {
        let mut reg = registry(IdPolicy::ReuseOnCollision);
        let (_, mut rx0) = reg.register();
        let (_, mut rx1) = reg.register();
        let (_, rx2) = reg.register();
        drop(rx2);

        assert_eq!(reg.deliver(5).await, 2);
        assert_eq!(reg.len(), 2);

        assert_eq!(rx0.try_recv(), Ok(5));
        assert_eq!(rx1.try_recv(), Ok(5));
    }
}
