use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use pings_types::events::Publication;

use crate::Notifier;

/// Forwards publications to an HTTP push relay.
///
/// Each publication is POSTed as JSON
/// (`{"destination":{"kind":"topic","target":..},"message":..,"messageStructure":..}`)
/// and the relay's status decides success. The relay owns fan-out to topic
/// subscribers and delivery to device push services.
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelay {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build relay HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl Notifier for HttpRelay {
    fn publish(&self, publication: Publication) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let res = self
                .client
                .post(&self.endpoint)
                .json(&publication)
                .send()
                .await
                .with_context(|| format!("Relay {} unreachable", self.endpoint))?;

            if let Err(e) = res.error_for_status_ref() {
                warn!("Relay rejected publication: {}", e);
                return Err(e.into());
            }

            debug!("Relay accepted publication for {:?}", publication.destination);
            Ok(())
        })
    }
}
