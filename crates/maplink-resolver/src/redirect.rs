//! Hop-by-hop redirect following.

use reqwest::Url;

use crate::client::{HttpClients, Identity, RedirectMode};
use crate::error::ResolveError;
use crate::html::deobfuscate_html;
use crate::sanitize::{sanitize_url, strip_control};

/// Where a manual redirect chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedPage {
    /// Sanitized URL of the last hop.
    pub final_url: String,
    /// Deobfuscated terminal body; empty when the hop budget ran out or the
    /// body was not textual.
    pub html: String,
}

/// Replays a redirect chain one request at a time.
///
/// Each `Location` is stripped of control characters and resolved against
/// the current URL, so relative redirects land where a browser would put
/// them. Stops at the first response without `Location` or after
/// `max_hops` requests, whichever comes first.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] if the start URL or a `Location`
/// cannot be resolved, and [`ResolveError::Http`] on network failure.
pub async fn follow_manually(
    http: &HttpClients,
    start_url: &str,
    identity: Identity,
    max_hops: usize,
) -> Result<FollowedPage, ResolveError> {
    let mut current =
        Url::parse(start_url).map_err(|e| ResolveError::invalid_url(start_url, e))?;
    let mut html = String::new();

    for hop in 0..max_hops {
        let page = http
            .fetch(current.as_str(), identity, RedirectMode::Manual)
            .await?;

        let location = page
            .location
            .as_deref()
            .map(strip_control)
            .filter(|l| !l.trim().is_empty());

        if let Some(location) = location {
            let next = current
                .join(location.trim())
                .map_err(|e| ResolveError::invalid_url(&location, e))?;
            tracing::debug!(
                hop,
                from = %current,
                to = %next,
                identity = identity.label(),
                "following redirect"
            );
            current = next;
            continue;
        }

        html = deobfuscate_html(&strip_control(&page.body));
        break;
    }

    Ok(FollowedPage {
        final_url: sanitize_url(current.as_str()),
        html,
    })
}
