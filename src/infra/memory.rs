//! In-memory collaborators.
//!
//! Back the CLI and tests; hosts normally implement the ports over their own
//! storage instead.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{CollaboratorError, DirtyFieldTracker, LinkProvider, VersionStore};
use crate::domain::content::{ContentObject, ObjectId};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

#[derive(Debug, Default, Clone)]
struct Versions {
    live: Option<ContentObject>,
    draft: Option<ContentObject>,
}

/// Version store holding live and draft copies keyed by object id.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    versions: RwLock<HashMap<ObjectId, Versions>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_live(&self, object: ContentObject) {
        let mut versions = rw_write(&self.versions, SOURCE, "put_live");
        let id = object.id.clone();
        versions.entry(id).or_default().live = Some(object);
    }

    pub fn put_draft(&self, object: ContentObject) {
        let mut versions = rw_write(&self.versions, SOURCE, "put_draft");
        let id = object.id.clone();
        versions.entry(id).or_default().draft = Some(object);
    }

    pub fn remove(&self, id: &ObjectId) {
        rw_write(&self.versions, SOURCE, "remove").remove(id);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.versions, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn live_version(
        &self,
        id: &ObjectId,
    ) -> Result<Option<ContentObject>, CollaboratorError> {
        let versions = rw_read(&self.versions, SOURCE, "live_version");
        Ok(versions.get(id).and_then(|entry| entry.live.clone()))
    }

    async fn draft_version(
        &self,
        id: &ObjectId,
    ) -> Result<Option<ContentObject>, CollaboratorError> {
        let versions = rw_read(&self.versions, SOURCE, "draft_version");
        Ok(versions.get(id).and_then(|entry| entry.draft.clone()))
    }
}

/// Dirty tracker that reports a fixed set of field names as changed.
#[derive(Debug, Default, Clone)]
pub struct StaticDirtyFields(BTreeSet<String>);

impl StaticDirtyFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }
}

impl DirtyFieldTracker for StaticDirtyFields {
    fn is_field_changed(&self, _object: &ContentObject, field: &str) -> bool {
        self.0.contains(field)
    }
}

/// Link provider returning fixed links for every object.
#[derive(Debug, Default, Clone)]
pub struct StaticLinks {
    purge_links: Option<Vec<String>>,
    link: Option<String>,
}

impl StaticLinks {
    pub fn new(purge_links: Option<Vec<String>>, link: Option<String>) -> Self {
        Self { purge_links, link }
    }

    /// Only the single-link fallback is available.
    pub fn single(link: impl Into<String>) -> Self {
        Self::new(None, Some(link.into()))
    }
}

impl LinkProvider for StaticLinks {
    fn purge_links(&self, _object: &ContentObject) -> Option<Vec<String>> {
        self.purge_links.clone()
    }

    fn link(&self, _object: &ContentObject) -> Option<String> {
        self.link.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn object(id: &str) -> ContentObject {
        ContentObject::new(ObjectId::from(id), true)
    }

    #[tokio::test]
    async fn stores_live_and_draft_separately() {
        let store = MemoryVersionStore::new();
        store.put_draft(object("1").with_field("Title", "Draft"));

        let id = ObjectId::from("1");
        assert!(store.live_version(&id).await.expect("lookup").is_none());
        let draft = store.draft_version(&id).await.expect("lookup");
        assert_eq!(
            draft.and_then(|d| d.field("Title").cloned()),
            Some("Draft".into())
        );

        store.put_live(object("1"));
        assert!(store.live_version(&id).await.expect("lookup").is_some());
        assert_eq!(store.len(), 1);

        store.remove(&id);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_have_no_versions() {
        let store = MemoryVersionStore::new();
        let id = ObjectId::from("missing");
        assert!(store.live_version(&id).await.expect("lookup").is_none());
        assert!(store.draft_version(&id).await.expect("lookup").is_none());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = MemoryVersionStore::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.versions.write().expect("lock should be acquired");
            panic!("poison version lock");
        }));

        store.put_live(object("1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn static_dirty_fields() {
        let tracker = StaticDirtyFields::new(["Sort"]);
        assert!(tracker.is_field_changed(&object("1"), "Sort"));
        assert!(!tracker.is_field_changed(&object("1"), "Title"));
    }

    #[test]
    fn static_links_expose_both_tiers() {
        let links = StaticLinks::new(Some(vec!["/a".into()]), Some("/b".into()));
        assert_eq!(links.purge_links(&object("1")), Some(vec!["/a".to_string()]));
        assert_eq!(LinkProvider::link(&links, &object("1")), Some("/b".to_string()));
    }
}
