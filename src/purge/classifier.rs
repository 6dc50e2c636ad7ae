//! Change classification.

use crate::domain::changes::{ChangeSet, SensitiveFields};
use crate::domain::types::Classification;

/// Decide whether a change can be purged per object or needs the whole site.
///
/// An unknown change set is never scoped: without a diff there is no way to
/// rule out a navigation change.
pub fn classify(changes: &ChangeSet, sensitive: &SensitiveFields) -> Classification {
    match changes {
        ChangeSet::Unknown => Classification::FullPurge,
        ChangeSet::Known(fields) if sensitive.intersects(fields) => Classification::FullPurge,
        ChangeSet::Known(_) => Classification::ScopedPurge,
    }
}
