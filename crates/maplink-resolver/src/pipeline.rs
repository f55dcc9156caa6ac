//! Short-link expansion and coordinate extraction.
//!
//! [`Resolver::expand_and_parse`] walks [`Strategy::ORDER`] and returns the
//! first usable result. Every strategy failure is logged and swallowed; an
//! exhausted cascade still yields the sanitized input.

use std::future::Future;
use std::pin::Pin;

use maplink_core::{LatLng, ResolvedLocation};
use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::bridge::{resolve_via_bridge, Bridge};
use crate::browser::{ChromiumRenderer, PageRenderer, RenderedPage};
use crate::classify::{has_coords, is_short_link_with, looks_like_long_maps_url};
use crate::client::{HttpClients, Identity};
use crate::config::ResolverConfig;
use crate::coords::{extract_poi_from_text, parse_lat_lng};
use crate::error::ResolveError;
use crate::html::{extract_place_id_from_html, locate_maps_url};
use crate::opaque::{follow_place_id, resolve_opaque};
use crate::redirect::follow_manually;
use crate::sanitize::{ensure_at_center, sanitize_url, strip_control, DEFAULT_ZOOM};

/// Nested short links carried in `?link=` are expanded at most this deep.
const MAX_EMBEDDED_DEPTH: usize = 3;

const EMBEDDED_LINK_HOST: &str = "maps.app.goo.gl";

/// A long-form URL reached from a short link, with coordinates when the
/// strategy found them somewhere other than the URL itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub url: String,
    pub coords: Option<LatLng>,
}

impl Expansion {
    fn bare(url: String) -> Self {
        Self { url, coords: None }
    }

    /// Re-anchors `url` at `coords` so the URL and the pair agree.
    fn anchored(url: &str, coords: LatLng) -> Self {
        Self {
            url: sanitize_url(&ensure_at_center(url, coords.lat, coords.lng, DEFAULT_ZOOM)),
            coords: Some(coords),
        }
    }
}

/// Expansion strategies, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `maps.app.goo.gl/?link=<url>` unwrapped without a request.
    EmbeddedLink,
    Applink,
    UrlRedirector,
    ManualMobile,
    ManualDesktop,
    /// Headless browser; only when everything else came up empty.
    Browser,
}

impl Strategy {
    pub const ORDER: [Self; 6] = [
        Self::EmbeddedLink,
        Self::Applink,
        Self::UrlRedirector,
        Self::ManualMobile,
        Self::ManualDesktop,
        Self::Browser,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::EmbeddedLink => "embedded link",
            Self::Applink => Bridge::Applink.name(),
            Self::UrlRedirector => Bridge::UrlRedirector.name(),
            Self::ManualMobile => "manual follow (mobile)",
            Self::ManualDesktop => "manual follow (desktop)",
            Self::Browser => "headless browser",
        }
    }
}

/// The resolution pipeline.
///
/// Holds the pooled HTTP clients and, when the browser fallback is enabled,
/// a renderer. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Resolver<R = ChromiumRenderer> {
    config: ResolverConfig,
    http: HttpClients,
    renderer: Option<R>,
}

impl Resolver<ChromiumRenderer> {
    /// Builds a resolver backed by Chromium when `config.browser.enabled`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be constructed.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let renderer = config
            .browser
            .enabled
            .then(|| ChromiumRenderer::new(config.browser.clone()));
        Self::with_renderer(config, renderer)
    }
}

impl<R: PageRenderer> Resolver<R> {
    /// Builds a resolver with an explicit renderer; `None` disables the
    /// browser fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be constructed.
    pub fn with_renderer(config: ResolverConfig, renderer: Option<R>) -> Result<Self, ResolveError> {
        let http = HttpClients::new(&config)?;
        Ok(Self {
            config,
            http,
            renderer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Short-link check including the configured extra hosts.
    #[must_use]
    pub fn is_short(&self, url: &str) -> bool {
        is_short_link_with(url, &self.config.extra_short_hosts)
    }

    /// Resolves `url` to a sanitized long-form URL and, when determinable,
    /// its coordinates.
    ///
    /// Returns `None` only for missing or blank input. Short links are
    /// expanded first; anything else is parsed as-is without touching the
    /// network.
    pub async fn expand_and_parse(
        &self,
        url: Option<&str>,
        prefer_center: bool,
    ) -> Option<ResolvedLocation> {
        let cleaned = strip_control(url?);
        let input = cleaned.trim();
        if input.is_empty() {
            return None;
        }

        let mut current = input.to_owned();
        if self.is_short(&current) {
            if let Some(expansion) = self.expand_rich(&current, 0).await {
                if let Some(coords) = expansion.coords {
                    let final_url = sanitize_url(&ensure_at_center(
                        &expansion.url,
                        coords.lat,
                        coords.lng,
                        DEFAULT_ZOOM,
                    ));
                    return Some(ResolvedLocation::new(final_url, Some(coords)));
                }
                current = expansion.url;
            } else {
                tracing::debug!(url = %current, "short link left unresolved");
            }
        }

        // Coordinates are read before sanitizing: `/data=` segments carry the
        // POI marker.
        let coords = parse_lat_lng(&current, prefer_center);
        Some(ResolvedLocation::new(sanitize_url(&current), coords))
    }

    /// Expands a short link to its long-form URL.
    pub async fn expand_short_url(&self, url: &str) -> Option<String> {
        let cleaned = strip_control(url);
        self.expand_rich(cleaned.trim(), 0)
            .await
            .map(|expansion| expansion.url)
    }

    /// Runs only the headless browser stage.
    pub async fn expand_with_browser(&self, short_url: &str) -> Option<Expansion> {
        match self.browser_stage(short_url).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(url = short_url, error = %e, "browser stage failed");
                None
            }
        }
    }

    fn expand_rich<'a>(
        &'a self,
        url: &'a str,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Option<Expansion>> + Send + 'a>> {
        Box::pin(async move {
            for strategy in Strategy::ORDER {
                match self.run(strategy, url, depth).await {
                    Ok(Some(expansion)) => {
                        tracing::debug!(
                            strategy = strategy.name(),
                            url,
                            expanded = %expansion.url,
                            "strategy resolved short link"
                        );
                        return Some(expansion);
                    }
                    Ok(None) => {
                        tracing::debug!(strategy = strategy.name(), url, "strategy yielded nothing");
                    }
                    Err(e) => {
                        tracing::debug!(strategy = strategy.name(), url, error = %e, "strategy failed");
                    }
                }
            }
            None
        })
    }

    async fn run(
        &self,
        strategy: Strategy,
        url: &str,
        depth: usize,
    ) -> Result<Option<Expansion>, ResolveError> {
        match strategy {
            Strategy::EmbeddedLink => Ok(self.embedded_stage(url, depth).await),
            Strategy::Applink => self.bridge_stage(Bridge::Applink, url).await,
            Strategy::UrlRedirector => self.bridge_stage(Bridge::UrlRedirector, url).await,
            Strategy::ManualMobile => self.manual_stage(url, Identity::Mobile).await,
            Strategy::ManualDesktop => self.manual_stage(url, Identity::Desktop).await,
            Strategy::Browser => self.browser_stage(url).await,
        }
    }

    /// Once a `?link=` target is present this stage always answers, falling
    /// back to the target itself.
    async fn embedded_stage(&self, url: &str, depth: usize) -> Option<Expansion> {
        let link = sanitize_url(&embedded_link(url)?);

        if self.is_short(&link) {
            if depth >= MAX_EMBEDDED_DEPTH {
                tracing::debug!(link = %link, depth, "embedded link nesting too deep");
                return Some(Expansion::bare(link));
            }
            let nested = self.expand_rich(&link, depth + 1).await;
            return Some(nested.unwrap_or_else(|| Expansion::bare(link)));
        }

        let resolved = resolve_opaque(&self.http, &self.config, &link)
            .await
            .unwrap_or(link);
        Some(Expansion::bare(resolved))
    }

    async fn bridge_stage(
        &self,
        bridge: Bridge,
        url: &str,
    ) -> Result<Option<Expansion>, ResolveError> {
        let resolved = resolve_via_bridge(&self.http, &self.config, bridge, url).await?;
        Ok(Some(Expansion::bare(resolved)))
    }

    async fn manual_stage(
        &self,
        url: &str,
        identity: Identity,
    ) -> Result<Option<Expansion>, ResolveError> {
        let followed =
            follow_manually(&self.http, url, identity, self.config.manual_max_hops).await?;
        let final_url = followed.final_url;
        let html = followed.html;

        // Step 1: the redirect chain already left the short-link domain.
        if !self.is_short(&final_url) {
            if has_coords(&final_url) {
                return Ok(Some(Expansion::bare(final_url)));
            }
            if let Some(hopped) = resolve_opaque(&self.http, &self.config, &final_url).await {
                return Ok(Some(Expansion::bare(hopped)));
            }
        }

        // Step 2: a map URL referenced by the terminal page.
        let Some(found) = locate_maps_url(&html, &final_url) else {
            return Ok(None);
        };
        let mut clean = sanitize_url(&found);
        if has_coords(&clean) {
            return Ok(Some(Expansion::bare(clean)));
        }

        // Step 3: opaque identifiers.
        if let Some(place_id) = extract_place_id_from_html(&html) {
            match follow_place_id(&self.http, &self.config, &place_id).await {
                Ok(resolved) => clean = sanitize_url(&resolved),
                Err(e) => tracing::debug!(place_id = %place_id, error = %e, "place ID from page failed"),
            }
        } else if let Some(hopped) = resolve_opaque(&self.http, &self.config, &clean).await {
            clean = hopped;
        }

        // Step 4: POI marker in the page text.
        if !has_coords(&clean) {
            if let Some(poi) = extract_poi_from_text(&html) {
                return Ok(Some(Expansion::anchored(&clean, poi)));
            }
        }

        // Step 5
        Ok(looks_like_long_maps_url(&clean).then(|| Expansion::bare(clean)))
    }

    async fn browser_stage(&self, url: &str) -> Result<Option<Expansion>, ResolveError> {
        let Some(renderer) = &self.renderer else {
            return Ok(None);
        };
        let page = renderer.render(url).await?;
        Ok(Some(expansion_from_page(&page)))
    }
}

/// Coordinates from the settled URL first, the rendered text second.
fn expansion_from_page(page: &RenderedPage) -> Expansion {
    let coords = parse_lat_lng(&page.url, false).or_else(|| extract_poi_from_text(&page.html));
    match coords {
        Some(coords) => Expansion::anchored(&page.url, coords),
        None => Expansion::bare(sanitize_url(&page.url)),
    }
}

/// The `link` target of a `maps.app.goo.gl/?link=<url>` wrapper.
fn embedded_link(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if !host.ends_with(EMBEDDED_LINK_HOST) {
        return None;
    }
    let (_, value) = parsed.query_pairs().find(|(k, _)| k == "link")?;
    // Some producers double-encode the target.
    let decoded = percent_decode_str(&value)
        .decode_utf8()
        .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
    decoded.starts_with("http").then_some(decoded)
}
