//! Record lifecycle events
//!
//! Store mutations are published as explicit events to a table of registered
//! subscribers. Side effects such as blob cleanup live in subscribers instead
//! of being wired implicitly to the store.

use crate::types::{ArtifactKind, ArtifactRecord, ContentHash};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error};

/// Artifact record events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecordEvent {
    /// A record was inserted, validated or not
    Created { record: ArtifactRecord },
    /// The ledger confirmed registration of a record
    Validated {
        kind: ArtifactKind,
        content_hash: ContentHash,
    },
    /// A record was removed from the store
    Deleted { record: ArtifactRecord },
}

impl RecordEvent {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            RecordEvent::Created { record } | RecordEvent::Deleted { record } => record.kind,
            RecordEvent::Validated { kind, .. } => *kind,
        }
    }
}

/// Event as delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedEvent {
    pub event: RecordEvent,
    pub timestamp: SystemTime,
}

/// Handler registered in the emitter's subscriber table
#[async_trait::async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn handle_event(
        &self,
        event: &EnhancedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Subscriber name for logs
    fn name(&self) -> &'static str;

    fn is_interested(&self, event: &RecordEvent) -> bool {
        let _ = event;
        true
    }
}

/// Publishes record events to registered subscribers and broadcast receivers
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<EnhancedEvent>,
    subscribers: Arc<RwLock<Vec<Arc<dyn EventSubscriber>>>>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Run every interested subscriber in registration order, then broadcast.
    /// A failing subscriber is logged and does not stop the others.
    pub async fn publish(&self, event: RecordEvent) {
        let enhanced_event = EnhancedEvent {
            event,
            timestamp: SystemTime::now(),
        };

        let subscribers = self.subscribers.read().await;
        for subscriber in subscribers.iter() {
            if !subscriber.is_interested(&enhanced_event.event) {
                continue;
            }
            match subscriber.handle_event(&enhanced_event).await {
                Ok(()) => debug!(subscriber = subscriber.name(), "Event handled"),
                Err(e) => error!(
                    subscriber = subscriber.name(),
                    error = %e,
                    "Failed to handle event"
                ),
            }
        }
        drop(subscribers);

        // No receivers is the normal case
        let _ = self.sender.send(enhanced_event);
    }

    pub async fn register_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.push(subscriber);
        debug!(total_subscribers = subscribers.len(), "Registered event subscriber");
    }

    /// Receive every published event on a broadcast channel
    pub fn subscribe(&self) -> broadcast::Receiver<EnhancedEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        kind: ArtifactKind,
        seen: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EventSubscriber for Counting {
        async fn handle_event(
            &self,
            _event: &EnhancedEvent,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }

        fn is_interested(&self, event: &RecordEvent) -> bool {
            event.kind() == self.kind
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl EventSubscriber for Failing {
        async fn handle_event(
            &self,
            _event: &EnhancedEvent,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("boom".into())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn deleted(kind: ArtifactKind) -> RecordEvent {
        let hash = ContentHash::parse("a".repeat(64)).unwrap();
        RecordEvent::Deleted {
            record: ArtifactRecord::new(hash, kind, PathBuf::from("/tmp/blob")),
        }
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_interesting_events() {
        let emitter = EventEmitter::default();
        let models = Arc::new(Counting {
            kind: ArtifactKind::Model,
            seen: AtomicUsize::new(0),
        });
        emitter.register_subscriber(models.clone()).await;

        emitter.publish(deleted(ArtifactKind::Model)).await;
        emitter.publish(deleted(ArtifactKind::Algorithm)).await;

        assert_eq!(models.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_stop_dispatch() {
        let emitter = EventEmitter::default();
        let datasets = Arc::new(Counting {
            kind: ArtifactKind::Dataset,
            seen: AtomicUsize::new(0),
        });
        emitter.register_subscriber(Arc::new(Failing)).await;
        emitter.register_subscriber(datasets.clone()).await;

        emitter.publish(deleted(ArtifactKind::Dataset)).await;

        assert_eq!(datasets.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broadcast_receivers_get_events() {
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();

        emitter.publish(deleted(ArtifactKind::Model)).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.kind(), ArtifactKind::Model);
    }
}
