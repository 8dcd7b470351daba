//! Broadcaster implementation
//!
//! The producer side: owns the registry and fans every published value out
//! to each attached endpoint.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::config::BroadcasterConfig;
use super::listener::Listener;
use super::registry::{BroadcasterStats, Registry};

/// Fan-out broadcaster
///
/// One lock guards the whole registry and is held for the full duration of
/// every operation, including the pushes inside [`publish`](Self::publish).
/// A single full endpoint therefore stalls delivery to everyone else as well
/// as any concurrent subscribe or discard until its listener drains it.
///
/// Cloning yields another handle to the same broadcaster. When the last
/// handle is dropped, every listener observes end-of-stream.
pub struct Broadcaster<T> {
    registry: Arc<Mutex<Registry<T>>>,
    config: Arc<BroadcasterConfig>,
}

impl<T> Broadcaster<T> {
    /// Create a broadcaster whose endpoints buffer `capacity` values
    ///
    /// A capacity of 0 makes every endpoint un-buffered: a publish waits
    /// until each listener takes the value.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(BroadcasterConfig::default().capacity(capacity))
    }

    /// Create a broadcaster with custom configuration
    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new(&config))),
            config: Arc::new(config),
        }
    }

    /// Get the broadcaster configuration
    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    /// Register a new listener
    ///
    /// After close this still succeeds; the listener immediately observes
    /// end-of-stream.
    ///
    /// A subscribe racing an in-flight publish may or may not see that value.
    pub async fn subscribe(&self) -> Listener<T> {
        let mut registry = self.registry.lock().await;
        let (id, receiver) = registry.register();

        tracing::debug!(
            broadcast = %registry.label,
            id = id,
            subscribers = registry.len(),
            closed = registry.is_closed(),
            "Listener subscribed"
        );

        Listener::new(id, receiver, Arc::downgrade(&self.registry))
    }

    /// Close the broadcaster
    ///
    /// Terminates every endpoint handed out so far, including discarded ones.
    /// Listeners drain what is buffered and then observe end-of-stream.
    /// Closing twice does nothing.
    pub async fn close(&self) {
        let mut registry = self.registry.lock().await;

        if registry.close() {
            tracing::info!(
                broadcast = %registry.label,
                subscribers = registry.len(),
                "Broadcaster closed"
            );
        }
    }

    /// Check if the broadcaster has been closed
    pub async fn is_closed(&self) -> bool {
        self.registry.lock().await.is_closed()
    }

    /// Number of registered listeners
    pub async fn subscriber_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> BroadcasterStats {
        self.registry.lock().await.stats()
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Publish a value to every registered listener
    ///
    /// Pushes into each endpoint in turn while holding the lock, waiting
    /// without timeout on any that is full. Returns the number of listeners
    /// the value was delivered to.
    ///
    /// # Panics
    ///
    /// Panics if the broadcaster has been closed. Publishing after close is a
    /// misuse of the API, not a recoverable condition.
    pub async fn publish(&self, value: T) -> usize {
        let mut registry = self.registry.lock().await;

        if registry.is_closed() {
            panic!("broadcast: publish after close");
        }

        let delivered = registry.deliver(value).await;

        tracing::trace!(
            broadcast = %registry.label,
            delivered = delivered,
            "Value published"
        );

        delivered
    }
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::with_config(BroadcasterConfig::default())
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
