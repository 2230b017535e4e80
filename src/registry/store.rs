//! Source registry implementation
//!
//! The central registry that owns every source and routes frames from
//! producers to subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::capture::BackendFactory;
use crate::encode::{FrameEncoder, JpegEncoder};
use crate::lifecycle::SourceController;
use crate::source::{SourceConfig, SourceId, SourceInfo};
use crate::stats::{SourceCounters, SourceStats};

use super::config::RegistryConfig;
use super::distributor::Distributor;
use super::entry::SourceEntry;
use super::error::RegistryError;
use super::subscription::Subscription;

/// Map of source id to entry, guarded by the registry's single lock
pub(crate) type SourceMap = RwLock<HashMap<SourceId, SourceEntry>>;

/// Central registry for all capture sources
///
/// Thread-safe via a single `RwLock`. The lock is only held across map
/// access: backend opens, channel sends and task joins all happen outside it,
/// so registry calls never wait on capture I/O.
pub struct SourceRegistry {
    /// Map of source id to source entry
    sources: Arc<SourceMap>,

    /// Opens capture backends
    factory: Arc<dyn BackendFactory>,

    /// Encodes raw frames for every source
    encoder: Arc<dyn FrameEncoder>,

    /// Tags registrations so a stale distributor never touches a newer
    /// source with the same id
    next_generation: AtomicU64,

    /// Configuration
    config: RegistryConfig,
}

impl SourceRegistry {
    /// Create a registry with default configuration
    pub fn new(factory: impl BackendFactory) -> Self {
        Self::with_config(factory, RegistryConfig::default())
    }

    /// Create a registry with custom configuration and the JPEG encoder
    pub fn with_config(factory: impl BackendFactory, config: RegistryConfig) -> Self {
        let encoder = JpegEncoder::new(config.jpeg_quality);
        Self::with_encoder(Arc::new(factory), Arc::new(encoder), config)
    }

    /// Create a registry with a custom payload encoder
    pub fn with_encoder(
        factory: Arc<dyn BackendFactory>,
        encoder: Arc<dyn FrameEncoder>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            sources: Arc::new(RwLock::new(HashMap::new())),
            factory,
            encoder,
            next_generation: AtomicU64::new(1),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a source and start capturing
    ///
    /// All or nothing: on error no task is running and nothing is registered.
    /// The source runs until it is removed or its capture fails.
    pub async fn add_source(&self, config: SourceConfig) -> Result<SourceId, RegistryError> {
        self.add_source_with_cancel(config, &CancellationToken::new()).await
    }

    /// Register a source that also stops when `cancel` is cancelled
    ///
    /// Cancelling the token retires the source the same way a capture failure
    /// does: it leaves the registry and its subscriptions end.
    pub async fn add_source_with_cancel(
        &self,
        config: SourceConfig,
        cancel: &CancellationToken,
    ) -> Result<SourceId, RegistryError> {
        let id = config.id();

        if self.sources.read().await.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        // The backend may take a while to open; do it without the lock
        let counters = Arc::new(SourceCounters::new());
        let mut controller = SourceController::with_parent(config, Arc::clone(&counters), cancel);
        let output = match controller
            .open(
                Arc::clone(&self.factory),
                Arc::clone(&self.encoder),
                self.config.output_capacity,
            )
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(source = %id, error = %e, "Failed to open capture backend");
                return Err(RegistryError::BackendOpen(id, e));
            }
        };

        let mut sources = self.sources.write().await;

        if sources.contains_key(&id) {
            // Lost a race with a concurrent add of the same source
            drop(sources);
            controller.stop().await;
            return Err(RegistryError::AlreadyExists(id));
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let distributor = Distributor {
            id: id.clone(),
            generation,
            output,
            sources: Arc::downgrade(&self.sources),
            cancel: controller.cancel_token(),
            counters: Arc::clone(&counters),
        };

        controller.start();
        let distributor = tokio::spawn(distributor.run());

        sources.insert(
            id.clone(),
            SourceEntry {
                generation,
                controller,
                subscribers: Arc::from(Vec::new()),
                distributor: Some(distributor),
                counters,
            },
        );

        tracing::info!(source = %id, sources = sources.len(), "Source added");

        Ok(id)
    }

    /// Stop a source and close all of its subscriber queues
    ///
    /// When this returns, every subscription to the source has seen (or will
    /// see, after draining buffered frames) the end of its stream.
    pub async fn remove_source(&self, id: &SourceId) -> Result<(), RegistryError> {
        let entry = self
            .sources
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let subscribers = entry.subscribers.len();
        entry.shutdown().await;

        tracing::info!(source = %id, subscribers = subscribers, "Source removed");

        Ok(())
    }

    /// Subscribe to a source's frames
    pub async fn subscribe(&self, id: &SourceId) -> Result<Subscription, RegistryError> {
        let mut sources = self.sources.write().await;

        let entry = sources
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let (subscriber, subscription) =
            Subscription::channel(id.clone(), self.config.subscriber_capacity);
        entry.attach(subscriber);

        tracing::info!(
            source = %id,
            subscribers = entry.subscribers.len(),
            "Subscriber added"
        );

        Ok(subscription)
    }

    /// Snapshot of every registered source, ordered by id
    pub async fn list_sources(&self) -> Vec<SourceInfo> {
        let sources = self.sources.read().await;
        let mut infos: Vec<SourceInfo> = sources.values().map(SourceEntry::info).collect();
        drop(sources);

        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Snapshot of one source
    pub async fn source_info(&self, id: &SourceId) -> Option<SourceInfo> {
        self.sources.read().await.get(id).map(SourceEntry::info)
    }

    /// Get source statistics
    pub async fn source_stats(&self, id: &SourceId) -> Option<SourceStats> {
        self.sources.read().await.get(id).map(SourceEntry::stats)
    }

    /// Get total number of sources
    pub async fn source_count(&self) -> usize {
        self.sources.read().await.len()
    }

    /// Remove every source
    pub async fn shutdown(&self) {
        let entries: Vec<(SourceId, SourceEntry)> =
            self.sources.write().await.drain().collect();

        if entries.is_empty() {
            return;
        }

        tracing::info!(sources = entries.len(), "Stopping all sources");

        for (id, entry) in entries {
            entry.shutdown().await;
            tracing::debug!(source = %id, "Source stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::capture::{BackendError, CaptureBackend, SyntheticConfig, SyntheticFactory};
    use crate::source::SourceKind;

    fn registry() -> SourceRegistry {
        SourceRegistry::new(SyntheticFactory::new(
            SyntheticConfig::default().size(16, 16).fps(200),
        ))
    }

    fn clip() -> SourceConfig {
        SourceConfig::new(SourceKind::File, "clip.mp4")
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let registry = registry();

        let id = registry.add_source(clip()).await.unwrap();
        assert_eq!(id.as_str(), "file_clip.mp4");

        let sources = registry.list_sources().await;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, id);
        assert_eq!(sources[0].kind, SourceKind::File);
        assert_eq!(sources[0].uri, "clip.mp4");
        assert!(sources[0].is_streaming);

        tokio_test::assert_ok!(registry.remove_source(&id).await);
        assert!(registry.list_sources().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let registry = registry();

        let id = registry.add_source(clip()).await.unwrap();
        let result = registry.add_source(clip()).await;
        assert!(matches!(result, Err(RegistryError::AlreadyExists(ref dup)) if *dup == id));

        assert_eq!(registry.source_count().await, 1);
        assert!(registry.source_info(&id).await.unwrap().is_streaming);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_unparsable_webcam_uri_opens_default_device() {
        let registry = registry();

        let id = registry
            .add_source(SourceConfig::new(SourceKind::Webcam, "front-door"))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "webcam_front-door");
        assert!(registry.source_info(&id).await.unwrap().is_streaming);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_file_uri_fails_to_open() {
        let registry = registry();

        let result = registry
            .add_source(SourceConfig::new(SourceKind::File, ""))
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::BackendOpen(_, BackendError::Open(_)))
        ));
        assert_eq!(registry.source_count().await, 0);
    }

    #[test]
    fn test_unsupported_kind_is_config_error() {
        let err = SourceConfig::parse("screen", "0").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[tokio::test]
    async fn test_cancelled_source_is_retired() {
        let registry = registry();
        let cancel = CancellationToken::new();

        let id = registry
            .add_source_with_cancel(clip(), &cancel)
            .await
            .unwrap();
        let mut subscription = registry.subscribe(&id).await.unwrap();
        assert!(subscription.recv().await.is_some());

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), async {
            while subscription.recv().await.is_some() {}
        })
        .await
        .unwrap();
        assert!(registry.list_sources().await.is_empty());
        assert!(matches!(
            registry.remove_source(&id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_open_failure_registers_nothing() {
        let registry = SourceRegistry::new(
            |config: &SourceConfig| -> Result<Box<dyn CaptureBackend>, BackendError> {
                Err(BackendError::Open(format!("cannot open {}", config.uri)))
            },
        );

        let result = registry
            .add_source(SourceConfig::new(SourceKind::IpCamera, "rtsp://10.0.0.9/live"))
            .await;
        match result {
            Err(RegistryError::BackendOpen(id, BackendError::Open(msg))) => {
                assert_eq!(id.as_str(), "ip_camera_rtsp://10.0.0.9/live");
                assert!(msg.contains("rtsp://10.0.0.9/live"));
            }
            other => panic!("expected backend open error, got {:?}", other),
        }
        assert!(registry.list_sources().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_unknown() {
        let registry = registry();

        let result = registry.subscribe(&SourceId::from("unknown")).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert_eq!(registry.source_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_unknown() {
        let registry = registry();

        let err = tokio_test::assert_err!(
            registry.remove_source(&SourceId::from("file_nope.mp4")).await
        );
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subscribe_receives_in_order() {
        let registry = registry();
        let id = registry.add_source(clip()).await.unwrap();

        let mut subscription = registry.subscribe(&id).await.unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.source_id, id);
        assert!(second.sequence > first.sequence);
        assert_eq!(&first.payload[..2], &[0xFF, 0xD8]);

        let stats = registry.source_stats(&id).await.unwrap();
        assert_eq!(stats.subscriber_count, 1);
        assert!(stats.frames_produced >= 2);

        registry.remove_source(&id).await.unwrap();
        while subscription.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_readd_after_remove() {
        let registry = registry();

        let id = registry.add_source(clip()).await.unwrap();
        registry.remove_source(&id).await.unwrap();

        let again = registry.add_source(clip()).await.unwrap();
        assert_eq!(again, id);
        assert_eq!(registry.source_count().await, 1);

        registry.shutdown().await;
        assert_eq!(registry.source_count().await, 0);
    }
}
