//! Lifecycle decision table.
//!
//! Maps the three lifecycle moments a host reports onto a purge decision.

use serde::{Deserialize, Serialize};

use crate::domain::changes::{ChangeSet, SensitiveFields};
use crate::domain::types::{Classification, PurgeDecision, PurgeScope};

use super::classifier::classify;

/// Lifecycle moments a host integration reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// About to publish a draft; carries the draft-vs-live diff.
    PrePublish(ChangeSet),
    /// A record was written; carries the field-level dirty set.
    ///
    /// Ignored for versioned objects.
    PostWrite(ChangeSet),
    /// A record was deleted.
    PostDelete,
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::PrePublish(_) => EventKind::PrePublish,
            LifecycleEvent::PostWrite(_) => EventKind::PostWrite,
            LifecycleEvent::PostDelete => EventKind::PostDelete,
        }
    }
}

/// Name of a lifecycle moment without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    PrePublish,
    PostWrite,
    PostDelete,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PrePublish => "pre-publish",
            EventKind::PostWrite => "post-write",
            EventKind::PostDelete => "post-delete",
        }
    }
}

/// Object metadata supplied alongside each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectState {
    pub versioned: bool,
    pub show_in_menu: bool,
}

/// Decide what an event purges. `None` means the event does not apply.
pub fn decide(
    event: &LifecycleEvent,
    state: ObjectState,
    sensitive: &SensitiveFields,
) -> Option<PurgeDecision> {
    match event {
        LifecycleEvent::PrePublish(_) if !state.versioned => None,
        LifecycleEvent::PrePublish(changes) => Some(classified(changes, sensitive)),
        LifecycleEvent::PostWrite(_) if state.versioned => {
            Some(PurgeDecision::scoped(PurgeScope::Draft))
        }
        LifecycleEvent::PostWrite(changes) => Some(classified(changes, sensitive)),
        LifecycleEvent::PostDelete if state.show_in_menu => Some(PurgeDecision::everything()),
        LifecycleEvent::PostDelete if state.versioned => {
            Some(PurgeDecision::scoped(PurgeScope::Both))
        }
        LifecycleEvent::PostDelete => Some(PurgeDecision::scoped(PurgeScope::Live)),
    }
}

fn classified(changes: &ChangeSet, sensitive: &SensitiveFields) -> PurgeDecision {
    match classify(changes, sensitive) {
        Classification::FullPurge => PurgeDecision::everything(),
        Classification::ScopedPurge => PurgeDecision::scoped(PurgeScope::Live),
    }
}
