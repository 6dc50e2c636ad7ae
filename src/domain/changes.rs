//! Change sets and navigation-sensitive field names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::content::ContentObject;

/// Field names whose change is presumed to alter site navigation.
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 5] =
    ["ShowInMenus", "Sort", "ParentID", "URLSegment", "MenuTitle"];

/// Fields that changed between two versions of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    Known(BTreeSet<String>),
    /// No baseline to compare against.
    Unknown,
}

impl ChangeSet {
    pub fn unknown() -> Self {
        Self::Unknown
    }

    pub fn none() -> Self {
        Self::Known(BTreeSet::new())
    }

    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Known(names.into_iter().map(Into::into).collect())
    }

    /// Field-by-field comparison of two versions.
    ///
    /// A field present in only one version counts as changed.
    pub fn between(live: &ContentObject, draft: &ContentObject) -> Self {
        let names: BTreeSet<&String> = live.fields.keys().chain(draft.fields.keys()).collect();
        Self::Known(
            names
                .into_iter()
                .filter(|name| live.fields.get(*name) != draft.fields.get(*name))
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, field: &str) -> bool {
        match self {
            Self::Known(fields) => fields.contains(field),
            Self::Unknown => false,
        }
    }
}

/// Configurable set of navigation-sensitive field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensitiveFields(BTreeSet<String>);

impl SensitiveFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True when any changed field is sensitive.
    pub fn intersects(&self, changes: &BTreeSet<String>) -> bool {
        // Iterate the smaller side.
        if changes.len() < self.0.len() {
            changes.iter().any(|field| self.0.contains(field))
        } else {
            self.0.iter().any(|field| changes.contains(field))
        }
    }
}

impl Default for SensitiveFields {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS)
    }
}
