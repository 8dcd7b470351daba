//! Endpoint error types
//!
//! Error types returned by the non-blocking endpoint operations.

/// Error returned by [`EndpointReceiver::try_recv`](super::EndpointReceiver::try_recv)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// No value is buffered right now, but more may arrive
    Empty,
    /// The endpoint is terminated and fully drained
    Closed,
}

impl std::fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "Endpoint is empty"),
            TryRecvError::Closed => write!(f, "Endpoint is closed"),
        }
    }
}

impl std::error::Error for TryRecvError {}

/// Error returned by [`EndpointSender::push`](super::EndpointSender::push)
///
/// Carries the value back to the caller since it could not be enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError<T> {
    /// The receiving half was dropped
    Orphaned(T),
    /// The endpoint was already terminated
    Closed(T),
}

impl<T> PushError<T> {
    /// Recover the value that was not delivered
    pub fn into_inner(self) -> T {
        match self {
            PushError::Orphaned(value) | PushError::Closed(value) => value,
        }
    }
}

impl<T> std::fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::Orphaned(_) => write!(f, "Endpoint receiver was dropped"),
            PushError::Closed(_) => write!(f, "Push into a closed endpoint"),
        }
    }
}

impl<T: std::fmt::Debug> std::error::Error for PushError<T> {}
