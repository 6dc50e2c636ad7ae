//! JSON event documents for the command-line harness.
//!
//! ```json
//! {
//!   "object": {"id": "12", "versioned": true, "fields": {"Title": "About"}},
//!   "live": {"id": "12", "versioned": true, "fields": {"Title": "Old"}},
//!   "draft": null,
//!   "dirty_fields": ["Title"],
//!   "purge_links": null,
//!   "link": "/about"
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::AsyncReadExt;

use crate::application::ports::{NoticeSink, PurgeTransport};
use crate::domain::content::{ContentObject, ObjectId};
use crate::purge::Collaborators;

use super::error::InfraError;
use super::memory::{MemoryVersionStore, StaticDirtyFields, StaticLinks};

/// One lifecycle event's worth of host-supplied context.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDocument {
    /// The object the event is about.
    pub object: ContentObject,
    #[serde(default)]
    pub live: Option<ContentObject>,
    #[serde(default)]
    pub draft: Option<ContentObject>,
    /// Fields reported dirty after a write.
    #[serde(default)]
    pub dirty_fields: Vec<String>,
    #[serde(default)]
    pub purge_links: Option<Vec<String>>,
    #[serde(default)]
    pub link: Option<String>,
}

impl EventDocument {
    pub fn from_json(text: &str) -> Result<Self, InfraError> {
        let document: Self =
            serde_json::from_str(text).map_err(|err| InfraError::fixture(err.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Read a document from `path`, or from stdin when `path` is `-`.
    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let text = if path.as_os_str() == "-" {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        } else {
            tokio::fs::read_to_string(path).await?
        };
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), InfraError> {
        let id = ObjectId::parse(self.object.id.as_str())?;
        for (label, version) in [("live", &self.live), ("draft", &self.draft)] {
            if let Some(version) = version
                && version.id != id
            {
                return Err(InfraError::fixture(format!(
                    "{label} version id `{}` does not match object id `{id}`",
                    version.id
                )));
            }
        }
        Ok(())
    }

    /// Build in-memory collaborators that answer from this document.
    pub fn collaborators(
        &self,
        transport: Arc<dyn PurgeTransport>,
        notices: Arc<dyn NoticeSink>,
    ) -> Collaborators {
        let versions = MemoryVersionStore::new();
        if let Some(live) = &self.live {
            versions.put_live(live.clone());
        }
        if let Some(draft) = &self.draft {
            versions.put_draft(draft.clone());
        }

        Collaborators {
            versions: Arc::new(versions),
            dirty_fields: Arc::new(StaticDirtyFields::new(self.dirty_fields.iter().cloned())),
            links: Arc::new(StaticLinks::new(
                self.purge_links.clone(),
                self.link.clone(),
            )),
            transport,
            notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TracingNoticeSink;
    use crate::infra::transport::LogTransport;

    #[test]
    fn parses_minimal_document() {
        let document = EventDocument::from_json(r#"{"object": {"id": "5"}}"#).expect("valid");
        assert_eq!(document.object.id.as_str(), "5");
        assert!(document.live.is_none());
        assert!(document.dirty_fields.is_empty());
    }

    #[test]
    fn rejects_blank_object_id() {
        let err = EventDocument::from_json(r#"{"object": {"id": "  "}}"#).expect_err("invalid");
        assert!(matches!(err, InfraError::Domain(_)));
    }

    #[test]
    fn rejects_mismatched_version_ids() {
        let err = EventDocument::from_json(
            r#"{"object": {"id": "5"}, "live": {"id": "6"}}"#,
        )
        .expect_err("invalid");
        assert!(err.to_string().contains("live version id"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(EventDocument::from_json(r#"{"object": {"id": "5"}, "extra": 1}"#).is_err());
    }

    #[tokio::test]
    async fn collaborators_answer_from_document() {
        let document = EventDocument::from_json(
            r#"{
                "object": {"id": "5", "versioned": true},
                "draft": {"id": "5", "fields": {"Title": "New"}},
                "dirty_fields": ["Sort"],
                "link": "/news"
            }"#,
        )
        .expect("valid");

        let collaborators =
            document.collaborators(Arc::new(LogTransport), Arc::new(TracingNoticeSink));
        let id = ObjectId::from("5");

        assert!(collaborators.versions.live_version(&id).await.expect("lookup").is_none());
        assert!(collaborators.versions.draft_version(&id).await.expect("lookup").is_some());
        assert!(collaborators.dirty_fields.is_field_changed(&document.object, "Sort"));
        assert_eq!(
            collaborators.links.link(&document.object),
            Some("/news".to_string())
        );
    }
}
