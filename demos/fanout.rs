//! Fan-out demo
//!
//! Run with: cargo run --example fanout [LISTENERS] [FRAMES]
//!
//! Spawns a number of listeners, publishes `Bytes` frames to all of them,
//! drops one listener half-way and then closes the stream.
//!
//! Set `RUST_LOG=fanout_rs=trace` to see every publish.

use std::time::Duration;

use bytes::Bytes;
use fanout_rs::{Broadcaster, BroadcasterConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fanout_rs=debug".parse()?)
                .add_directive("fanout=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let listeners: usize = args.get(1).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(3);
    let frames: usize = args.get(2).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(10);

    let config = BroadcasterConfig::default().capacity(4).label("demo");
    let bcast = Broadcaster::<Bytes>::with_config(config);

    let mut handles = Vec::with_capacity(listeners);
    for n in 0..listeners {
        let mut listener = bcast.subscribe().await;
        handles.push(tokio::spawn(async move {
            let mut received = 0usize;
            let mut bytes = 0usize;

            while let Some(frame) = listener.recv().await {
                received += 1;
                bytes += frame.len();

                // The first listener leaves half-way through by dropping its handle
                if n == 0 && received == frames / 2 {
                    tracing::info!(id = listener.id(), received, "Listener left early");
                    break;
                }

                // Simulate a slower consumer
                if n == listeners - 1 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }

            (listener.id(), received, bytes)
        }));
    }

    for i in 0..frames {
        let frame = Bytes::from(format!("frame-{i:04}"));
        let delivered = bcast.publish(frame).await;
        tracing::info!(frame = i, delivered, "Published");
    }

    let stats = bcast.stats().await;
    tracing::info!(
        subscribers = stats.subscribers,
        detached = stats.detached,
        "Closing broadcaster"
    );
    bcast.close().await;

    for handle in handles {
        let (id, received, bytes) = handle.await?;
        tracing::info!(id, received, bytes, "Listener finished");
    }

    Ok(())
}
