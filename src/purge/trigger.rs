//! Purge trigger service.
//!
//! Receives lifecycle events from the host, gathers the change set from the
//! collaborators, decides, plans and submits the purge. Transport failures are
//! reported through the notice sink and never surface as errors: a failed
//! purge must not block the content operation that caused it.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::links;
use crate::application::ports::{
    DirtyFieldTracker, LinkProvider, NoticeSink, PurgeTransport, VersionStore,
};
use crate::domain::changes::ChangeSet;
use crate::domain::content::ContentObject;
use crate::domain::types::PurgeRequest;

use super::config::PurgeConfig;
use super::events::PurgeEvent;
use super::lifecycle::{EventKind, LifecycleEvent, ObjectState, decide};
use super::planner::PurgePlan;

pub(crate) const METRIC_PURGE_TOTAL: &str = "edgepurge_purge_total";
pub(crate) const METRIC_PURGE_URLS_TOTAL: &str = "edgepurge_purge_urls_total";
pub(crate) const METRIC_TRANSPORT_FAILURE_TOTAL: &str = "edgepurge_transport_failure_total";
pub(crate) const METRIC_DISPATCH_MS: &str = "edgepurge_dispatch_ms";

/// The collaborators a trigger talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub versions: Arc<dyn VersionStore>,
    pub dirty_fields: Arc<dyn DirtyFieldTracker>,
    pub links: Arc<dyn LinkProvider>,
    pub transport: Arc<dyn PurgeTransport>,
    pub notices: Arc<dyn NoticeSink>,
}

/// Why an event produced no purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Purging is switched off in configuration.
    Disabled,
    /// The event does not apply to this object (publish of an unversioned record).
    NotApplicable,
}

/// An event with its computed plan, ready to dispatch.
#[derive(Debug, Clone)]
pub enum PreparedPurge {
    Skipped {
        event: PurgeEvent,
        reason: SkipReason,
    },
    Planned {
        event: PurgeEvent,
        plan: PurgePlan,
    },
}

impl PreparedPurge {
    pub fn event(&self) -> &PurgeEvent {
        match self {
            PreparedPurge::Skipped { event, .. } | PreparedPurge::Planned { event, .. } => event,
        }
    }

    pub fn plan(&self) -> Option<&PurgePlan> {
        match self {
            PreparedPurge::Skipped { .. } => None,
            PreparedPurge::Planned { plan, .. } => Some(plan),
        }
    }
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurgeOutcome {
    Skipped { reason: SkipReason },
    /// Scoped purge for an object without URLs; nothing was sent.
    NoLinks,
    PurgedEverything,
    PurgedUrls { urls: Vec<String> },
    /// The transport failed. Already reported to the notice sink.
    TransportFailed {
        request: PurgeRequest,
        error: String,
    },
}

/// Entry point for host lifecycle hooks.
///
/// # Usage
///
/// ```ignore
/// // Before the CMS copies a draft to live:
/// trigger.pre_publish(&draft).await;
/// ```
pub struct PurgeTrigger {
    config: PurgeConfig,
    collaborators: Collaborators,
}

impl PurgeTrigger {
    pub fn new(config: PurgeConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// A draft is about to be published.
    pub async fn pre_publish(&self, object: &ContentObject) -> PurgeOutcome {
        self.handle(EventKind::PrePublish, object).await
    }

    /// A record was written.
    pub async fn post_write(&self, object: &ContentObject) -> PurgeOutcome {
        self.handle(EventKind::PostWrite, object).await
    }

    /// A record was deleted.
    pub async fn post_delete(&self, object: &ContentObject) -> PurgeOutcome {
        self.handle(EventKind::PostDelete, object).await
    }

    /// Prepare and dispatch in one step.
    pub async fn handle(&self, kind: EventKind, object: &ContentObject) -> PurgeOutcome {
        let prepared = self.prepare(kind, object).await;
        self.dispatch(prepared).await
    }

    /// Compute the plan for an event without contacting the transport.
    #[instrument(skip(self, object), fields(object_id = %object.id))]
    pub async fn prepare(&self, kind: EventKind, object: &ContentObject) -> PreparedPurge {
        let event = PurgeEvent::new(kind, object.id.clone());

        info!(
            event_id = %event.id,
            event_kind = kind.as_str(),
            received_at = %event.received_at(),
            versioned = object.versioned,
            "Purge event received"
        );

        if !self.config.enabled {
            debug!(event_id = %event.id, "Purge skipped: disabled");
            return PreparedPurge::Skipped {
                event,
                reason: SkipReason::Disabled,
            };
        }

        let state = ObjectState {
            versioned: object.versioned,
            show_in_menu: object.flag(&self.config.delete_menu_flag),
        };
        let lifecycle = self.lifecycle_event(kind, object).await;

        let Some(decision) = decide(&lifecycle, state, &self.config.sensitive_fields) else {
            debug!(event_id = %event.id, "Purge skipped: event not applicable");
            return PreparedPurge::Skipped {
                event,
                reason: SkipReason::NotApplicable,
            };
        };

        let links = if decision.full {
            Vec::new()
        } else {
            links::resolve(self.collaborators.links.as_ref(), object)
        };

        let mut plan = PurgePlan::compute(decision, &links, &self.config.stage);
        if let Some(base) = &self.config.base_url {
            plan.request = plan.request.absolutize(base);
        }

        info!(event_id = %event.id, plan = %plan, "Purge planned");

        PreparedPurge::Planned { event, plan }
    }

    /// Submit a prepared plan. Never fails; see [`PurgeOutcome`].
    pub async fn dispatch(&self, prepared: PreparedPurge) -> PurgeOutcome {
        let (event, plan) = match prepared {
            PreparedPurge::Skipped { reason, .. } => return PurgeOutcome::Skipped { reason },
            PreparedPurge::Planned { event, plan } => (event, plan),
        };

        if plan.is_noop() {
            info!(event_id = %event.id, "Purge skipped: object has no links");
            return PurgeOutcome::NoLinks;
        }

        let kind = plan.request.kind();
        let started_at = Instant::now();
        let transport = &self.collaborators.transport;
        let result = match &plan.request {
            PurgeRequest::Everything => transport.purge_everything().await,
            PurgeRequest::Urls(urls) => transport.purge_urls(urls).await,
        };
        histogram!(METRIC_DISPATCH_MS, "kind" => kind)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(()) => {
                counter!(METRIC_PURGE_TOTAL, "kind" => kind).increment(1);
                info!(
                    event_id = %event.id,
                    event_kind = event.kind.as_str(),
                    request_kind = kind,
                    "Purge submitted"
                );
                match plan.request {
                    PurgeRequest::Everything => PurgeOutcome::PurgedEverything,
                    PurgeRequest::Urls(urls) => {
                        counter!(METRIC_PURGE_URLS_TOTAL).increment(urls.len() as u64);
                        PurgeOutcome::PurgedUrls { urls }
                    }
                }
            }
            Err(error) => {
                counter!(METRIC_TRANSPORT_FAILURE_TOTAL, "kind" => kind).increment(1);
                self.collaborators.notices.notice(&format!(
                    "CDN purge failed for {} of object {}: {error}",
                    event.kind.as_str(),
                    event.object_id
                ));
                PurgeOutcome::TransportFailed {
                    request: plan.request,
                    error: error.to_string(),
                }
            }
        }
    }

    async fn lifecycle_event(&self, kind: EventKind, object: &ContentObject) -> LifecycleEvent {
        match kind {
            EventKind::PrePublish if object.versioned => {
                LifecycleEvent::PrePublish(self.publish_changes(object).await)
            }
            EventKind::PrePublish => LifecycleEvent::PrePublish(ChangeSet::unknown()),
            EventKind::PostWrite if object.versioned => {
                LifecycleEvent::PostWrite(ChangeSet::none())
            }
            EventKind::PostWrite => LifecycleEvent::PostWrite(self.dirty_changes(object)),
            EventKind::PostDelete => LifecycleEvent::PostDelete,
        }
    }

    /// Draft-vs-live diff. Any lookup failure or missing version is unknown.
    async fn publish_changes(&self, object: &ContentObject) -> ChangeSet {
        let versions = &self.collaborators.versions;
        let (live, draft) = tokio::join!(
            versions.live_version(&object.id),
            versions.draft_version(&object.id)
        );

        match (live, draft) {
            (Ok(Some(live)), Ok(Some(draft))) => ChangeSet::between(&live, &draft),
            (Ok(live), Ok(draft)) => {
                debug!(
                    object_id = %object.id,
                    has_live = live.is_some(),
                    has_draft = draft.is_some(),
                    "No baseline to diff against"
                );
                ChangeSet::unknown()
            }
            (Err(error), _) | (_, Err(error)) => {
                warn!(
                    object_id = %object.id,
                    error = %error,
                    "Version lookup failed; treating change set as unknown"
                );
                ChangeSet::unknown()
            }
        }
    }

    /// Only sensitive fields are consulted; others cannot change the outcome.
    fn dirty_changes(&self, object: &ContentObject) -> ChangeSet {
        let tracker = &self.collaborators.dirty_fields;
        ChangeSet::fields(
            self.config
                .sensitive_fields
                .iter()
                .filter(|field| tracker.is_field_changed(object, field)),
        )
    }

    /// Get the underlying config.
    pub fn config(&self) -> &PurgeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::application::ports::{CollaboratorError, TransportError};
    use crate::domain::content::ObjectId;
    use crate::domain::types::{PurgeDecision, PurgeScope};
    use crate::infra::memory::{MemoryVersionStore, StaticDirtyFields, StaticLinks};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Urls(Vec<String>),
        Everything,
    }

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("calls lock").clone()
        }

        fn outcome(&self) -> Result<(), TransportError> {
            if self.fail {
                Err(TransportError::request("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PurgeTransport for RecordingTransport {
        async fn purge_urls(&self, urls: &[String]) -> Result<(), TransportError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(Call::Urls(urls.to_vec()));
            self.outcome()
        }

        async fn purge_everything(&self) -> Result<(), TransportError> {
            self.calls.lock().expect("calls lock").push(Call::Everything);
            self.outcome()
        }
    }

    #[derive(Default)]
    struct RecordingNotices(Mutex<Vec<String>>);

    impl NoticeSink for RecordingNotices {
        fn notice(&self, message: &str) {
            self.0.lock().expect("notices lock").push(message.to_string());
        }
    }

    /// Link provider that counts how often it is asked.
    struct CountingLinks {
        inner: StaticLinks,
        calls: AtomicUsize,
    }

    impl CountingLinks {
        fn new(inner: StaticLinks) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LinkProvider for CountingLinks {
        fn purge_links(&self, object: &ContentObject) -> Option<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.purge_links(object)
        }

        fn link(&self, object: &ContentObject) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.link(object)
        }
    }

    struct BrokenVersions;

    #[async_trait]
    impl VersionStore for BrokenVersions {
        async fn live_version(
            &self,
            _id: &ObjectId,
        ) -> Result<Option<ContentObject>, CollaboratorError> {
            Err(CollaboratorError::lookup("database unavailable"))
        }

        async fn draft_version(
            &self,
            _id: &ObjectId,
        ) -> Result<Option<ContentObject>, CollaboratorError> {
            Err(CollaboratorError::Timeout)
        }
    }

    struct Harness {
        trigger: PurgeTrigger,
        transport: Arc<RecordingTransport>,
        notices: Arc<RecordingNotices>,
        links: Arc<CountingLinks>,
    }

    fn harness_with(
        config: PurgeConfig,
        versions: Arc<dyn VersionStore>,
        dirty: &[&str],
        transport: RecordingTransport,
    ) -> Harness {
        let transport = Arc::new(transport);
        let notices = Arc::new(RecordingNotices::default());
        let links = Arc::new(CountingLinks::new(StaticLinks::single("/about")));
        let collaborators = Collaborators {
            versions,
            dirty_fields: Arc::new(StaticDirtyFields::new(dirty.iter().copied())),
            links: links.clone(),
            transport: transport.clone(),
            notices: notices.clone(),
        };
        Harness {
            trigger: PurgeTrigger::new(config, collaborators),
            transport,
            notices,
            links,
        }
    }

    fn harness(versions: Arc<dyn VersionStore>, dirty: &[&str]) -> Harness {
        harness_with(
            PurgeConfig::default(),
            versions,
            dirty,
            RecordingTransport::default(),
        )
    }

    fn page(versioned: bool) -> ContentObject {
        ContentObject::new(ObjectId::from("42"), versioned).with_field("Title", "About")
    }

    #[tokio::test]
    async fn publish_of_new_object_purges_everything() {
        let store = Arc::new(MemoryVersionStore::new());
        store.put_draft(page(true));
        let h = harness(store, &[]);

        let outcome = h.trigger.pre_publish(&page(true)).await;

        assert_eq!(outcome, PurgeOutcome::PurgedEverything);
        assert_eq!(h.transport.calls(), vec![Call::Everything]);
    }

    #[tokio::test]
    async fn publish_with_local_change_purges_live_links() {
        let store = Arc::new(MemoryVersionStore::new());
        store.put_live(page(true));
        store.put_draft(page(true).with_field("Content", "new body"));
        let h = harness(store, &[]);

        let outcome = h.trigger.pre_publish(&page(true)).await;

        assert_eq!(
            outcome,
            PurgeOutcome::PurgedUrls {
                urls: vec!["/about".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn publish_with_menu_change_purges_everything() {
        let store = Arc::new(MemoryVersionStore::new());
        store.put_live(page(true).with_field("MenuTitle", "About"));
        store.put_draft(page(true).with_field("MenuTitle", "About us"));
        let h = harness(store, &[]);

        assert_eq!(
            h.trigger.pre_publish(&page(true)).await,
            PurgeOutcome::PurgedEverything
        );
    }

    #[tokio::test]
    async fn version_lookup_failure_is_treated_as_unknown() {
        let h = harness(Arc::new(BrokenVersions), &[]);

        assert_eq!(
            h.trigger.pre_publish(&page(true)).await,
            PurgeOutcome::PurgedEverything
        );
    }

    #[tokio::test]
    async fn publish_of_unversioned_object_is_not_applicable() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &[]);

        assert_eq!(
            h.trigger.pre_publish(&page(false)).await,
            PurgeOutcome::Skipped {
                reason: SkipReason::NotApplicable
            }
        );
        assert!(h.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn write_of_unversioned_object_with_menu_change_purges_everything() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &["ShowInMenus", "Title"]);

        assert_eq!(
            h.trigger.post_write(&page(false)).await,
            PurgeOutcome::PurgedEverything
        );
    }

    #[tokio::test]
    async fn write_of_unversioned_object_purges_live() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &["Title"]);

        assert_eq!(
            h.trigger.post_write(&page(false)).await,
            PurgeOutcome::PurgedUrls {
                urls: vec!["/about".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn write_of_versioned_object_purges_stage_variant() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &["ParentID"]);

        assert_eq!(
            h.trigger.post_write(&page(true)).await,
            PurgeOutcome::PurgedUrls {
                urls: vec!["/about?stage=Stage".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn delete_of_versioned_object_purges_both_variants() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &[]);

        let prepared = h.trigger.prepare(EventKind::PostDelete, &page(true)).await;
        assert_eq!(
            prepared.plan().map(|plan| plan.decision),
            Some(PurgeDecision::scoped(PurgeScope::Both))
        );

        assert_eq!(
            h.trigger.dispatch(prepared).await,
            PurgeOutcome::PurgedUrls {
                urls: vec!["/about".to_string(), "/about?stage=Stage".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn delete_of_menu_item_purges_everything() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &[]);
        let object = page(true).with_field("ShowInMenu", 1);

        assert_eq!(
            h.trigger.post_delete(&object).await,
            PurgeOutcome::PurgedEverything
        );
    }

    #[tokio::test]
    async fn delete_checks_show_in_menu_not_show_in_menus() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &[]);
        let object = page(false).with_field("ShowInMenus", true);

        assert_eq!(
            h.trigger.post_delete(&object).await,
            PurgeOutcome::PurgedUrls {
                urls: vec!["/about".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn full_purges_never_resolve_links() {
        let store = Arc::new(MemoryVersionStore::new());
        store.put_draft(page(true));
        let h = harness(store, &["ShowInMenus"]);

        assert_eq!(
            h.trigger.pre_publish(&page(true)).await,
            PurgeOutcome::PurgedEverything
        );
        assert_eq!(
            h.trigger.post_write(&page(false)).await,
            PurgeOutcome::PurgedEverything
        );
        assert_eq!(
            h.trigger
                .post_delete(&page(true).with_field("ShowInMenu", true))
                .await,
            PurgeOutcome::PurgedEverything
        );

        assert_eq!(h.links.calls(), 0);
        assert_eq!(h.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn scoped_purge_consults_link_provider() {
        let h = harness(Arc::new(MemoryVersionStore::new()), &[]);

        h.trigger.post_delete(&page(false)).await;

        // No purge list, so `link` is consulted after `purge_links`.
        assert_eq!(h.links.calls(), 2);
    }

    #[tokio::test]
    async fn object_without_links_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let collaborators = Collaborators {
            versions: Arc::new(MemoryVersionStore::new()),
            dirty_fields: Arc::new(StaticDirtyFields::default()),
            links: Arc::new(StaticLinks::default()),
            transport: transport.clone(),
            notices: Arc::new(RecordingNotices::default()),
        };
        let trigger = PurgeTrigger::new(PurgeConfig::default(), collaborators);

        assert_eq!(trigger.post_delete(&page(true)).await, PurgeOutcome::NoLinks);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_and_noticed() {
        let h = harness_with(
            PurgeConfig::default(),
            Arc::new(MemoryVersionStore::new()),
            &[],
            RecordingTransport::failing(),
        );

        let outcome = h.trigger.post_delete(&page(false)).await;

        assert!(matches!(
            outcome,
            PurgeOutcome::TransportFailed { ref error, .. } if error.contains("connection refused")
        ));
        let notices = h.notices.0.lock().expect("notices lock").clone();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("post-delete"));
        assert!(notices[0].contains("42"));
    }

    #[tokio::test]
    async fn disabled_config_skips_everything() {
        let config = PurgeConfig {
            enabled: false,
            ..Default::default()
        };
        let h = harness_with(
            config,
            Arc::new(MemoryVersionStore::new()),
            &["Sort"],
            RecordingTransport::default(),
        );

        assert_eq!(
            h.trigger.post_write(&page(false)).await,
            PurgeOutcome::Skipped {
                reason: SkipReason::Disabled
            }
        );
        assert!(h.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn base_url_makes_urls_absolute() {
        let config = PurgeConfig {
            base_url: Some(Url::parse("https://example.com").expect("base url")),
            ..Default::default()
        };
        let h = harness_with(
            config,
            Arc::new(MemoryVersionStore::new()),
            &[],
            RecordingTransport::default(),
        );

        h.trigger.post_delete(&page(true)).await;

        assert_eq!(
            h.transport.calls(),
            vec![Call::Urls(vec![
                "https://example.com/about".to_string(),
                "https://example.com/about?stage=Stage".to_string(),
            ])]
        );
    }
}
