//! JSON webhook transport.
//!
//! Sends `{"files": [...]}` or `{"purge_everything": true}` to a purge
//! endpoint, the body shape CDN purge APIs commonly accept.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::ports::{PurgeTransport, TransportError};
use crate::config::TransportSettings;
use crate::infra::error::InfraError;

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PurgeBody<'a> {
    Files { files: &'a [String] },
    Everything { purge_everything: bool },
}

/// Posts purge requests to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: Client,
    endpoint: Url,
    batch_size: NonZeroUsize,
}

impl WebhookTransport {
    pub fn new(endpoint: Url, settings: &TransportSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            batch_size: settings.max_urls_per_request,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("edgepurge/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, body: &PurgeBody<'_>) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(TransportError::request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PurgeTransport for WebhookTransport {
    #[instrument(skip(self, urls), fields(endpoint = %self.endpoint, url_count = urls.len()))]
    async fn purge_urls(&self, urls: &[String]) -> Result<(), TransportError> {
        for (index, batch) in urls.chunks(self.batch_size.get()).enumerate() {
            debug!(batch = index, size = batch.len(), "Posting purge batch");
            self.post(&PurgeBody::Files { files: batch }).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn purge_everything(&self) -> Result<(), TransportError> {
        self.post(&PurgeBody::Everything {
            purge_everything: true,
        })
        .await
    }
}
