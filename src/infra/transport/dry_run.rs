use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{PurgeTransport, TransportError};

/// Dry-run transport: reports what would be purged and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl PurgeTransport for LogTransport {
    async fn purge_urls(&self, urls: &[String]) -> Result<(), TransportError> {
        info!(url_count = urls.len(), urls = ?urls, "Dry run: would purge URLs");
        Ok(())
    }

    async fn purge_everything(&self) -> Result<(), TransportError> {
        info!("Dry run: would purge everything");
        Ok(())
    }
}
