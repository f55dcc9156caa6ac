//! Provider redirect bridges that expand a short link without a browser.

use reqwest::Url;

use crate::client::{HttpClients, Identity, RedirectMode};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::html::best_candidate;
use crate::sanitize::sanitize_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bridge {
    /// `{applink_url}?source=applink&link=<short>`, mobile identity.
    Applink,
    /// `{redirector_url}?sa=t&source=maps_applink&url=<short>`, desktop identity.
    UrlRedirector,
}

impl Bridge {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Applink => "applink bridge",
            Self::UrlRedirector => "url redirector bridge",
        }
    }

    fn identity(self) -> Identity {
        match self {
            Self::Applink => Identity::Mobile,
            Self::UrlRedirector => Identity::Desktop,
        }
    }

    fn request_url(self, config: &ResolverConfig, short_url: &str) -> Result<Url, ResolveError> {
        let (base, params) = match self {
            Self::Applink => (
                config.applink_url.as_str(),
                vec![("source", "applink"), ("link", short_url)],
            ),
            Self::UrlRedirector => (
                config.redirector_url.as_str(),
                vec![("sa", "t"), ("source", "maps_applink"), ("url", short_url)],
            ),
        };
        Url::parse_with_params(base, &params).map_err(|e| ResolveError::invalid_url(base, e))
    }
}

/// Expands `short_url` through one bridge.
///
/// The settled URL is returned when redirects moved it somewhere under
/// `/maps`; otherwise the response body is scanned for the best map URL.
///
/// # Errors
///
/// Returns [`ResolveError::NoMatch`] when neither source yields a URL,
/// [`ResolveError::Http`] on network failure or redirect overflow.
pub async fn resolve_via_bridge(
    http: &HttpClients,
    config: &ResolverConfig,
    bridge: Bridge,
    short_url: &str,
) -> Result<String, ResolveError> {
    let target = bridge.request_url(config, short_url)?;
    let page = http
        .fetch(target.as_str(), bridge.identity(), RedirectMode::Follow)
        .await?;

    if page.url != target && page.url.as_str().contains("/maps") {
        tracing::debug!(bridge = bridge.name(), settled = %page.url, "bridge redirected");
        return Ok(sanitize_url(page.url.as_str()));
    }

    best_candidate(&page.body, page.url.as_str())
        .map(|found| sanitize_url(&found))
        .ok_or(ResolveError::NoMatch {
            strategy: bridge.name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applink_request_embeds_the_short_link() {
        let url = Bridge::Applink
            .request_url(&ResolverConfig::default(), "https://maps.app.goo.gl/AbC?g_st=i")
            .expect("valid bridge url");
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps?source=applink&link=https%3A%2F%2Fmaps.app.goo.gl%2FAbC%3Fg_st%3Di"
        );
    }

    #[test]
    fn redirector_request_uses_its_own_params() {
        let url = Bridge::UrlRedirector
            .request_url(&ResolverConfig::default(), "https://goo.gl/maps/x")
            .expect("valid bridge url");
        assert_eq!(
            url.as_str(),
            "https://www.google.com/url?sa=t&source=maps_applink&url=https%3A%2F%2Fgoo.gl%2Fmaps%2Fx"
        );
        assert_eq!(Bridge::UrlRedirector.identity(), Identity::Desktop);
        assert_eq!(Bridge::Applink.identity(), Identity::Mobile);
    }

    #[test]
    fn unusable_base_is_an_invalid_url() {
        let config = ResolverConfig {
            applink_url: "not a base".to_string(),
            ..ResolverConfig::default()
        };
        let err = Bridge::Applink.request_url(&config, "https://goo.gl/x").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { .. }), "got {err:?}");
    }
}
