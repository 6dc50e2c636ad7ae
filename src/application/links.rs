//! Link resolution with a fixed fallback order.

use tracing::debug;

use crate::domain::content::ContentObject;

use super::ports::LinkProvider;

/// Resolve the URLs belonging to `object`.
///
/// `purge_links` wins when the provider supplies it, even if empty. Otherwise
/// the single `link` is used. Empty strings are dropped so that an object
/// without a link never turns into a bare `?stage=Stage` purge.
pub fn resolve(provider: &dyn LinkProvider, object: &ContentObject) -> Vec<String> {
    let links = match provider.purge_links(object) {
        Some(links) => links,
        None => provider.link(object).into_iter().collect(),
    };

    let resolved: Vec<String> = links
        .into_iter()
        .filter(|link| !link.trim().is_empty())
        .collect();

    debug!(
        object_id = %object.id,
        link_count = resolved.len(),
        "Resolved object links"
    );

    resolved
}
