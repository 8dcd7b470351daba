//! Subscriber handle
//!
//! A [`Listener`] pairs the read half of one endpoint with a weak reference
//! back to the broadcaster that feeds it.

use std::fmt;
use std::sync::Weak;

use tokio::sync::Mutex;

use super::endpoint::EndpointReceiver;
use super::error::TryRecvError;
use super::registry::Registry;

/// Handle returned by [`Broadcaster::subscribe`](super::Broadcaster::subscribe)
///
/// Values arrive in publish order. Once the broadcaster is closed (or dropped),
/// the remaining buffered values are yielded followed by end-of-stream.
///
/// Dropping a listener without calling [`discard`](Self::discard) is fine:
/// its entry is reclaimed by the next publish or discard on the broadcaster.
pub struct Listener<T> {
    id: u64,
    receiver: EndpointReceiver<T>,
    owner: Weak<Mutex<Registry<T>>>,
}

impl<T> Listener<T> {
    pub(super) fn new(
        id: u64,
        receiver: EndpointReceiver<T>,
        owner: Weak<Mutex<Registry<T>>>,
    ) -> Self {
        Self {
            id,
            receiver,
            owner,
        }
    }

    /// Subscriber id assigned at subscribe time
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read-only endpoint this listener receives from
    pub fn receiver(&self) -> &EndpointReceiver<T> {
        &self.receiver
    }

    /// Mutable access to the endpoint, for receiving
    pub fn receiver_mut(&mut self) -> &mut EndpointReceiver<T> {
        &mut self.receiver
    }

    /// Receive the next value, or `None` at end-of-stream
    ///
    /// After a discard this yields whatever was already buffered and then
    /// waits until the broadcaster closes.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Receive the next value without waiting
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Detach from the broadcaster
    ///
    /// Values published after this returns are not delivered here. Values
    /// already buffered stay readable and the endpoint is not terminated.
    /// Calling it again, or after the broadcaster closed, does nothing.
    ///
    /// Takes the broadcaster's lock. Calling this from the task that should
    /// be draining a full endpoint while a publish waits on it never returns.
    pub async fn discard(&self) {
        let Some(owner) = self.owner.upgrade() else {
            return;
        };

        let mut registry = owner.lock().await;
        registry.prune_orphans();

        if registry.detach(self.id, &self.receiver) {
            tracing::debug!(
                broadcast = %registry.label,
                id = self.id,
                subscribers = registry.len(),
                "Listener discarded"
            );
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("receiver", &self.receiver)
            .finish()
    }
}
