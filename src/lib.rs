//! # fanout-rs
//!
//! Process-local fan-out broadcast for Tokio.
//!
//! One producer publishes; every subscribed [`Listener`] receives each value
//! through its own bounded endpoint.
//!
//! ```no_run
//! use fanout_rs::Broadcaster;
//!
//! # async fn run() {
//! let bcast = Broadcaster::new(16);
//! let mut listener = bcast.subscribe().await;
//!
//! bcast.publish("hello").await;
//! assert_eq!(listener.recv().await, Some("hello"));
//!
//! bcast.close().await;
//! assert_eq!(listener.recv().await, None);
//! # }
//! ```

pub mod broadcast;

pub use broadcast::{
    Broadcaster, BroadcasterConfig, BroadcasterStats, EndpointReceiver, EndpointSender, IdPolicy,
    Listener, PushError, TryRecvError,
};
