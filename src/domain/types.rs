//! Shared purge enumerations and the request handed to a transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which cached variant(s) of a URL to invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeScope {
    Live,
    Draft,
    Both,
}

impl PurgeScope {
    pub fn includes_live(self) -> bool {
        matches!(self, PurgeScope::Live | PurgeScope::Both)
    }

    pub fn includes_draft(self) -> bool {
        matches!(self, PurgeScope::Draft | PurgeScope::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurgeScope::Live => "live",
            PurgeScope::Draft => "draft",
            PurgeScope::Both => "both",
        }
    }
}

impl fmt::Display for PurgeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    FullPurge,
    ScopedPurge,
}

/// What a lifecycle event asks the CDN to forget.
///
/// `full = true` supersedes the object's own URLs; such decisions always carry
/// [`PurgeScope::Both`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeDecision {
    pub full: bool,
    pub scope: PurgeScope,
}

impl PurgeDecision {
    /// Purge every URL on the site.
    pub fn everything() -> Self {
        Self {
            full: true,
            scope: PurgeScope::Both,
        }
    }

    /// Purge only the object's own URLs in the given scope.
    pub fn scoped(scope: PurgeScope) -> Self {
        Self { full: false, scope }
    }
}

impl fmt::Display for PurgeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.full {
            f.write_str("full")
        } else {
            write!(f, "scoped({})", self.scope)
        }
    }
}

/// Concrete purge submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "urls", rename_all = "snake_case")]
pub enum PurgeRequest {
    /// Site-wide purge; never expressed as a URL list.
    Everything,
    /// Deduplicated URLs in first-seen order. Empty means nothing to do.
    Urls(Vec<String>),
}

impl PurgeRequest {
    pub fn is_noop(&self) -> bool {
        matches!(self, PurgeRequest::Urls(urls) if urls.is_empty())
    }

    pub fn urls(&self) -> Option<&[String]> {
        match self {
            PurgeRequest::Everything => None,
            PurgeRequest::Urls(urls) => Some(urls),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PurgeRequest::Everything => "everything",
            PurgeRequest::Urls(_) => "urls",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_membership() {
        assert!(PurgeScope::Live.includes_live());
        assert!(!PurgeScope::Live.includes_draft());
        assert!(PurgeScope::Draft.includes_draft());
        assert!(!PurgeScope::Draft.includes_live());
        assert!(PurgeScope::Both.includes_live());
        assert!(PurgeScope::Both.includes_draft());
    }

    #[test]
    fn full_decision_covers_both_variants() {
        let decision = PurgeDecision::everything();
        assert!(decision.full);
        assert_eq!(decision.scope, PurgeScope::Both);
        assert_eq!(decision.to_string(), "full");
        assert_eq!(
            PurgeDecision::scoped(PurgeScope::Draft).to_string(),
            "scoped(draft)"
        );
    }

    #[test]
    fn empty_url_request_is_noop() {
        assert!(PurgeRequest::Urls(Vec::new()).is_noop());
        assert!(!PurgeRequest::Everything.is_noop());
        assert!(PurgeRequest::Everything.urls().is_none());
    }

    #[test]
    fn request_serializes_with_kind_tag() {
        let json = serde_json::to_value(PurgeRequest::Urls(vec!["/a".into()])).expect("json");
        assert_eq!(json["kind"], "urls");
        assert_eq!(json["urls"][0], "/a");

        let json = serde_json::to_value(PurgeRequest::Everything).expect("json");
        assert_eq!(json["kind"], "everything");
    }
}
