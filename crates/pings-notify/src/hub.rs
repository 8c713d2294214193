use std::sync::Arc;

use anyhow::Result;
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;
use tracing::debug;

use pings_types::events::{Destination, Publication};

use crate::Notifier;

/// In-process pub/sub transport.
///
/// Every publication is broadcast to all current subscribers; subscribers
/// filter by destination themselves. Used when no relay is configured and by
/// tests to observe what the handlers published.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    broadcast_tx: broadcast::Sender<Publication>,
}

impl Hub {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(HubInner { broadcast_tx }),
        }
    }

    /// Subscribe to publications. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Publication> {
        self.inner.broadcast_tx.subscribe()
    }

    fn subscriber_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for Hub {
    fn publish(&self, publication: Publication) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let listeners = self.subscriber_count();
            match &publication.destination {
                Destination::Topic(topic) => debug!("Hub: publish to topic {} ({} subscribers)", topic, listeners),
                Destination::Device(token) => debug!("Hub: push to device {} ({} subscribers)", token, listeners),
            }
            // No subscribers is not a failure: the message is simply dropped.
            let _ = self.inner.broadcast_tx.send(publication);
            Ok(())
        })
    }
}
