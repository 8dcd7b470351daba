//! Per-subscriber endpoint
//!
//! A single-producer, single-consumer queue with a fixed capacity and an
//! explicit terminal state. Capacity 0 makes the endpoint a hand-off: a push
//! only completes once the receiver has taken the value.
//!
//! The terminal state is separate from either half being dropped. Closing is
//! an explicit call on the sender; a receiver on an endpoint whose sender was
//! simply dropped keeps waiting, which is what a detached listener observes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::error::{PushError, TryRecvError};

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    receiver_alive: bool,
    /// Values ever enqueued; a push's ticket is its position in this count
    pushed: u64,
    /// Values ever taken by the receiver
    taken: u64,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    /// Signalled when a value is enqueued or the endpoint closes
    value_ready: Notify,
    /// Signalled when a value is taken or the receiver goes away
    space_ready: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a new endpoint pair
///
/// `capacity` is the number of values the endpoint buffers before a push
/// waits. 0 means un-buffered.
pub fn channel<T>(capacity: usize) -> (EndpointSender<T>, EndpointReceiver<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::with_capacity(capacity.max(1)),
            closed: false,
            receiver_alive: true,
            pushed: 0,
            taken: 0,
        }),
        capacity,
        value_ready: Notify::new(),
        space_ready: Notify::new(),
    });

    (
        EndpointSender {
            shared: Arc::clone(&shared),
        },
        EndpointReceiver { shared },
    )
}

/// Write half of an endpoint
pub struct EndpointSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> EndpointSender<T> {
    /// Push a value into the endpoint
    ///
    /// Waits while the buffer is full. On an un-buffered endpoint it also
    /// waits until the receiver has taken the value. There is no timeout.
    ///
    /// Returns the value back if the receiver is gone or the endpoint is
    /// terminated. A receiver dropped while a hand-off is pending wakes the
    /// push, which then returns the untaken value as [`PushError::Orphaned`].
    pub async fn push(&self, value: T) -> Result<(), PushError<T>> {
        let slots = self.shared.capacity.max(1);

        let ticket = loop {
            let notified = self.shared.space_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.shared.lock();
                if !state.receiver_alive {
                    return Err(PushError::Orphaned(value));
                }
                if state.closed {
                    return Err(PushError::Closed(value));
                }
                if state.queue.len() < slots {
                    state.queue.push_back(value);
                    state.pushed += 1;
                    break state.pushed;
                }
            }

            notified.await;
        };

        self.shared.value_ready.notify_waiters();

        if self.shared.capacity == 0 {
            loop {
                let notified = self.shared.space_ready.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                {
                    let mut state = self.shared.lock();
                    if state.taken >= ticket {
                        break;
                    }
                    if !state.receiver_alive {
                        // Nobody took the staged value; hand it back
                        match state.queue.pop_back() {
                            Some(value) => return Err(PushError::Orphaned(value)),
                            None => break,
                        }
                    }
                }

                notified.await;
            }
        }

        Ok(())
    }

    /// Move the endpoint into its terminal state
    ///
    /// Buffered values stay readable; once drained the receiver observes
    /// end-of-stream. Returns `false` if the endpoint was already terminated.
    pub fn close(&self) -> bool {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }

        self.shared.value_ready.notify_waiters();
        true
    }

    /// Check if the endpoint is terminated
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Check if the receiving half has been dropped
    pub fn is_orphaned(&self) -> bool {
        !self.shared.lock().receiver_alive
    }

    /// Check if `receiver` is the read half of this endpoint
    pub fn feeds(&self, receiver: &EndpointReceiver<T>) -> bool {
        Arc::ptr_eq(&self.shared, &receiver.shared)
    }
}

impl<T> fmt::Debug for EndpointSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("EndpointSender")
            .field("capacity", &self.shared.capacity)
            .field("buffered", &state.queue.len())
            .field("closed", &state.closed)
            .field("orphaned", &!state.receiver_alive)
            .finish()
    }
}

/// Read half of an endpoint
pub struct EndpointReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> EndpointReceiver<T> {
    /// Receive the next value
    ///
    /// Returns `None` once the endpoint is terminated and every buffered value
    /// has been read. Waits indefinitely on an open, empty endpoint.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let notified = self.shared.value_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.take() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => {}
            }

            notified.await;
        }
    }

    /// Receive the next value without waiting
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.take()
    }

    fn take(&self) -> Result<T, TryRecvError> {
        let value = {
            let mut state = self.shared.lock();
            match state.queue.pop_front() {
                Some(value) => {
                    state.taken += 1;
                    value
                }
                None if state.closed => return Err(TryRecvError::Closed),
                None => return Err(TryRecvError::Empty),
            }
        };

        self.shared.space_ready.notify_waiters();
        Ok(value)
    }

    /// Check if the endpoint has been moved into its terminal state
    ///
    /// Buffered values may still be pending.
    pub fn is_terminated(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of buffered values
    pub fn len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Check if no values are buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer capacity this endpoint was created with
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> Drop for EndpointReceiver<T> {
    fn drop(&mut self) {
        let discarded = {
            let mut state = self.shared.lock();
            state.receiver_alive = false;
            // An un-buffered endpoint's staged value goes back to its pusher
            if self.shared.capacity > 0 {
                std::mem::take(&mut state.queue)
            } else {
                VecDeque::new()
            }
        };
        drop(discarded);

        self.shared.space_ready.notify_waiters();
    }
}

impl<T> fmt::Debug for EndpointReceiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("EndpointReceiver")
            .field("capacity", &self.shared.capacity)
            .field("buffered", &state.queue.len())
            .field("terminated", &state.closed)
            .finish()
    }
}
