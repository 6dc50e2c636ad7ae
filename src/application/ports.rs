//! Collaborator traits the purge engine consumes.
//!
//! Hosts implement these over their own storage, link generation and CDN
//! client. `crate::infra` ships in-memory and HTTP implementations.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::domain::content::{ContentObject, ObjectId};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("version lookup failed: {0}")]
    Lookup(String),
    #[error("collaborator timed out")]
    Timeout,
}

impl CollaboratorError {
    pub fn lookup(err: impl std::fmt::Display) -> Self {
        Self::Lookup(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("purge request failed: {0}")]
    Request(String),
    #[error("purge endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }
}

/// Draft/live version lookup, used when a draft is about to be published.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn live_version(
        &self,
        id: &ObjectId,
    ) -> Result<Option<ContentObject>, CollaboratorError>;

    async fn draft_version(
        &self,
        id: &ObjectId,
    ) -> Result<Option<ContentObject>, CollaboratorError>;
}

/// Field-level dirty tracking for a record that was just written.
pub trait DirtyFieldTracker: Send + Sync {
    fn is_field_changed(&self, object: &ContentObject, field: &str) -> bool;
}

/// Source of the URLs an object is reachable at.
///
/// `purge_links` is preferred; `link` is consulted only when it returns
/// `None`. Implementors override whichever they support.
pub trait LinkProvider: Send + Sync {
    fn purge_links(&self, _object: &ContentObject) -> Option<Vec<String>> {
        None
    }

    fn link(&self, _object: &ContentObject) -> Option<String> {
        None
    }
}

/// The CDN purge API.
#[async_trait]
pub trait PurgeTransport: Send + Sync {
    async fn purge_urls(&self, urls: &[String]) -> Result<(), TransportError>;

    async fn purge_everything(&self) -> Result<(), TransportError>;
}

/// Where swallowed failures are reported.
pub trait NoticeSink: Send + Sync {
    fn notice(&self, message: &str);
}

/// Reports notices as `warn` level tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notice(&self, message: &str) {
        warn!(target: "edgepurge::notice", "{message}");
    }
}
