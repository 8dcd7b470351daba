//! Fan-out broadcast
//!
//! A [`Broadcaster`] pushes every published value into a per-listener
//! endpoint. Listeners join with [`Broadcaster::subscribe`] and leave with
//! [`Listener::discard`]; the producer ends the stream for everyone with
//! [`Broadcaster::close`].
//!
//! # Architecture
//!
//! ```text
//!                     Broadcaster (Arc<Mutex<Registry>>)
//!                 ┌──────────────────────────────────────┐
//!                 │ entries: HashMap<u64, EndpointSender>│
//!                 │ detached, next_id, capacity, closed  │
//!                 └───────────────┬──────────────────────┘
//!                                 │ publish(): push to each, in turn,
//!                                 │ lock held throughout
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [Listener 0]            [Listener 1]            [Listener 2]
//!    recv().await            recv().await            recv().await
//! ```
//!
//! # Delivery
//!
//! - Each listener sees values in publish order.
//! - Endpoints hold at most `capacity` values; publish waits on a full one
//!   and, because the lock is held, so does everything else.
//! - `capacity == 0` is a hand-off: publish waits until each listener takes
//!   the value.
//! - After close, listeners drain their buffers and then get `None`.
//! - After discard, a listener drains its buffer and then waits until the
//!   broadcaster closes.

pub mod broadcaster;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod listener;
mod registry;

pub use broadcaster::Broadcaster;
pub use config::{BroadcasterConfig, IdPolicy};
pub use endpoint::{EndpointReceiver, EndpointSender};
pub use error::{PushError, TryRecvError};
pub use listener::Listener;
pub use registry::BroadcasterStats;
