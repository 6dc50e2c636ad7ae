//! Purge set computation.
//!
//! Turns a decision plus an object's URLs into the request a transport
//! receives.

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::domain::types::{PurgeDecision, PurgeRequest};

use super::variant::StageVariant;

/// A decision together with the request it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgePlan {
    pub decision: PurgeDecision,
    pub request: PurgeRequest,
}

impl fmt::Display for PurgePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.request {
            PurgeRequest::Everything => {
                write!(f, "PurgePlan {{ decision: {}, everything }}", self.decision)
            }
            PurgeRequest::Urls(urls) => write!(
                f,
                "PurgePlan {{ decision: {}, urls: {} }}",
                self.decision,
                urls.len()
            ),
        }
    }
}

impl PurgePlan {
    /// Compute the purge request for `decision`.
    ///
    /// - Full decisions never look at `links`
    /// - Live URLs come first, then their stage variants
    /// - Duplicates are dropped, keeping the first occurrence
    pub fn compute(decision: PurgeDecision, links: &[String], stage: &StageVariant) -> Self {
        let request = if decision.full {
            PurgeRequest::Everything
        } else {
            let mut urls = Vec::new();
            if decision.scope.includes_live() {
                urls.extend(links.iter().cloned());
            }
            if decision.scope.includes_draft() {
                urls.extend(links.iter().map(|link| stage.to_stage_variant(link)));
            }
            PurgeRequest::Urls(dedupe(urls))
        };

        Self { decision, request }
    }

    /// Whether dispatching this plan would reach the transport.
    pub fn is_noop(&self) -> bool {
        self.request.is_noop()
    }
}

impl PurgeRequest {
    /// Resolve relative URLs against the site origin.
    ///
    /// Absolute URLs and URLs that fail to join are kept as they are.
    pub fn absolutize(self, base: &Url) -> Self {
        match self {
            PurgeRequest::Everything => PurgeRequest::Everything,
            PurgeRequest::Urls(urls) => PurgeRequest::Urls(dedupe(
                urls.into_iter()
                    .map(|url| {
                        if Url::parse(&url).is_ok() {
                            return url;
                        }
                        base.join(&url).map_or(url, String::from)
                    })
                    .collect(),
            )),
        }
    }
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
