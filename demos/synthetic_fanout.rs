//! Synthetic fan-out demo
//!
//! Run with: cargo run --example synthetic_fanout [SECONDS]
//!
//! Registers a looping file source and a webcam that drops out after a few
//! seconds, attaches a fast and a stalled subscriber to each, and logs what
//! every subscriber receives. Set `RUST_LOG=camera_hub=debug` for producer
//! and distributor detail.
//!
//! ## What to look for
//!
//! - The fast subscriber sees every frame in order
//! - The stalled subscriber stops at its queue capacity and never slows the
//!   fast one down
//! - When the webcam drops out it disappears from the source list and its
//!   subscribers see end of stream

use std::sync::Arc;
use std::time::Duration;

use camera_hub::capture::{SyntheticConfig, SyntheticFactory};
use camera_hub::{RegistryConfig, SourceConfig, SourceKind, SourceRegistry, Subscription};
use tracing_subscriber::EnvFilter;

async fn consume(name: String, mut subscription: Subscription) {
    let mut received = 0u64;
    let mut last = None;

    while let Some(frame) = subscription.recv().await {
        received += 1;
        if let Some(prev) = last {
            if frame.sequence != prev + 1 {
                tracing::info!(
                    subscriber = %name,
                    missed = frame.sequence - prev - 1,
                    "Gap in sequence"
                );
            }
        }
        last = Some(frame.sequence);

        if received % 60 == 0 {
            tracing::info!(
                subscriber = %name,
                sequence = frame.sequence,
                bytes = frame.payload.len(),
                "Receiving"
            );
        }
    }

    tracing::info!(subscriber = %name, received, "Stream ended");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let factory = SyntheticFactory::new(
        SyntheticConfig::default()
            .size(320, 240)
            .fps(30)
            .clip_length(90)
            .device_frame_limit(150),
    );
    let registry = Arc::new(SourceRegistry::with_config(
        factory,
        RegistryConfig::default().jpeg_quality(70),
    ));

    let clip = registry
        .add_source(SourceConfig::new(SourceKind::File, "clip.mp4"))
        .await?;
    let webcam = registry
        .add_source(SourceConfig::parse("webcam", "0")?)
        .await?;

    let mut consumers = Vec::new();
    let mut stalled = Vec::new();
    for id in [&clip, &webcam] {
        let fast = registry.subscribe(id).await?;
        consumers.push(tokio::spawn(consume(format!("{}/fast", id), fast)));
        // Never read; shows that a stalled consumer only costs itself
        stalled.push(registry.subscribe(id).await?);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    for _ in 0..seconds {
        ticker.tick().await;
        for info in registry.list_sources().await {
            let stats = registry.source_stats(&info.id).await.unwrap_or_default();
            tracing::info!(
                source = %info.id,
                streaming = info.is_streaming,
                produced = stats.frames_produced,
                subscriber_drops = stats.subscriber_drops,
                fps = stats.framerate(),
                "Source status"
            );
        }
    }

    registry.shutdown().await;
    for consumer in consumers {
        consumer.await?;
    }

    for subscription in stalled {
        let id = subscription.source_id().clone();
        let mut rx = subscription.into_inner();
        let mut buffered = 0;
        while rx.recv().await.is_some() {
            buffered += 1;
        }
        tracing::info!(source = %id, buffered, "Stalled subscriber drained");
    }

    Ok(())
}
