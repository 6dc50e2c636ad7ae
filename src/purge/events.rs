//! Purge event records.
//!
//! Every lifecycle notification the trigger handles is stamped with an id and
//! timestamp so log lines for one event can be correlated.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::domain::content::ObjectId;

use super::lifecycle::EventKind;

/// A lifecycle notification received for one object.
#[derive(Debug, Clone)]
pub struct PurgeEvent {
    /// Unique identifier (UUIDv4).
    pub id: Uuid,
    pub kind: EventKind,
    pub object_id: ObjectId,
    /// When the event was received.
    pub timestamp: OffsetDateTime,
}

impl PurgeEvent {
    pub fn new(kind: EventKind, object_id: ObjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            object_id,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Receipt time as RFC 3339 text.
    pub fn received_at(&self) -> String {
        self.timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.to_string())
    }
}
