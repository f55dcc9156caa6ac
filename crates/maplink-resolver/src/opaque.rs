//! Opaque identifiers (hex CIDs, `ChI…` place IDs, `/url?q=` wrappers)
//! turned into concrete map URLs.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;

use crate::client::{HttpClients, Identity, RedirectMode};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::sanitize::sanitize_url;

static HEX_CID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":0x([0-9a-fA-F]+)").expect("valid regex"));
static URL_PLACE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[?&]query_place_id=|place_id[:=])(ChI[0-9A-Za-z_-]+)").expect("valid regex")
});
static DATA_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!1s([^!]+)").expect("valid regex"));
static PLACE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ChI[0-9A-Za-z_-]+$").expect("valid regex"));

fn decode_or_raw(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// Whether `s` is exactly a `ChI…` place identifier.
#[must_use]
pub fn is_place_id(s: &str) -> bool {
    PLACE_ID_RE.is_match(s)
}

/// Last `:0x<hex>` token in the URL (the feature ID's CID half).
#[must_use]
pub fn extract_hex_cid(url: &str) -> Option<&str> {
    HEX_CID_RE
        .captures_iter(url)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Hex CID to its decimal form. `None` beyond 128 bits.
#[must_use]
pub fn cid_to_decimal(hex: &str) -> Option<String> {
    let trimmed = hex.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u128::from_str_radix(digits, 16).ok().map(|n| n.to_string())
}

/// A `ChI…` place ID carried by the URL itself.
#[must_use]
pub fn extract_place_id_from_url(url: &str) -> Option<String> {
    let decoded = decode_or_raw(url);
    if let Some(caps) = URL_PLACE_ID_RE.captures(&decoded) {
        return Some(caps[1].to_string());
    }
    let caps = DATA_ID_RE.captures(&decoded)?;
    let id = decode_or_raw(&caps[1]);
    is_place_id(&id).then(|| id.into_owned())
}

/// Target of a `…/url?q=<encoded>` wrapper, when it is an `http(s)` URL.
#[must_use]
pub fn unwrap_q_param(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !parsed.path().to_ascii_lowercase().ends_with("/url") {
        return None;
    }
    let (_, q) = parsed.query_pairs().find(|(k, _)| k == "q")?;
    let target = decode_or_raw(&q).into_owned();
    target.starts_with("http").then_some(target)
}

/// Resolves a hex CID through the lookup endpoint.
///
/// A redirect-less request is tried first and its `Location` returned;
/// without one, the fully followed request's settled URL is used.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] for an unusable CID or endpoint and
/// [`ResolveError::Http`] on network failure.
pub async fn follow_cid(
    http: &HttpClients,
    config: &ResolverConfig,
    hex: &str,
) -> Result<String, ResolveError> {
    let decimal = cid_to_decimal(hex).ok_or_else(|| ResolveError::InvalidUrl {
        url: hex.to_owned(),
        reason: "CID is not a 128-bit hex number".to_string(),
    })?;
    let lookup = Url::parse_with_params(&config.cid_lookup_url, [("cid", decimal.as_str())])
        .map_err(|e| ResolveError::invalid_url(&config.cid_lookup_url, e))?;

    let first = http
        .fetch(lookup.as_str(), Identity::Mobile, RedirectMode::Manual)
        .await?;
    if let Some(location) = first.location.filter(|l| !l.trim().is_empty()) {
        let next = lookup
            .join(location.trim())
            .map_err(|e| ResolveError::invalid_url(&location, e))?;
        return Ok(next.into());
    }

    let settled = http
        .fetch(lookup.as_str(), Identity::Mobile, RedirectMode::Follow)
        .await?;
    Ok(settled.url.into())
}

/// Resolves a place ID through the place search endpoint, fully followed.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] for an unusable endpoint and
/// [`ResolveError::Http`] on network failure.
pub async fn follow_place_id(
    http: &HttpClients,
    config: &ResolverConfig,
    place_id: &str,
) -> Result<String, ResolveError> {
    let search = Url::parse_with_params(
        &config.place_search_url,
        [("api", "1"), ("query_place_id", place_id)],
    )
    .map_err(|e| ResolveError::invalid_url(&config.place_search_url, e))?;
    let settled = http
        .fetch(search.as_str(), Identity::Mobile, RedirectMode::Follow)
        .await?;
    Ok(settled.url.into())
}

/// CID hop, then place-ID hop, then `/url?q=` unwrap; first success wins.
///
/// Each hop's failure is logged and swallowed. The result is sanitized.
pub async fn resolve_opaque(
    http: &HttpClients,
    config: &ResolverConfig,
    url: &str,
) -> Option<String> {
    if let Some(hex) = extract_hex_cid(url) {
        match follow_cid(http, config, hex).await {
            Ok(resolved) => return Some(sanitize_url(&resolved)),
            Err(e) => tracing::debug!(url, hex, error = %e, "CID lookup failed"),
        }
    }

    if let Some(place_id) = extract_place_id_from_url(url) {
        match follow_place_id(http, config, &place_id).await {
            Ok(resolved) => return Some(sanitize_url(&resolved)),
            Err(e) => tracing::debug!(url, place_id = %place_id, error = %e, "place ID lookup failed"),
        }
    }

    unwrap_q_param(url).map(|target| sanitize_url(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_last_hex_cid() {
        let url = "https://www.google.com/maps/place/X/data=!4m2!3m1!1s0x47e66e1f06e2b70f:0x40b82c3688c9460";
        assert_eq!(extract_hex_cid(url), Some("40b82c3688c9460"));
        assert_eq!(extract_hex_cid("https://www.google.com/maps"), None);
    }

    #[test]
    fn converts_hex_cid_to_decimal() {
        assert_eq!(cid_to_decimal("40b82c3688c9460").as_deref(), Some("291470376679806048"));
        assert_eq!(cid_to_decimal("0xff").as_deref(), Some("255"));
        assert_eq!(
            cid_to_decimal("ffffffffffffffffffffffffffffffff").as_deref(),
            Some("340282366920938463463374607431768211455")
        );
        assert_eq!(cid_to_decimal("1ffffffffffffffffffffffffffffffff"), None);
        assert_eq!(cid_to_decimal("xyz"), None);
    }

    #[test]
    fn finds_place_id_in_url() {
        assert_eq!(
            extract_place_id_from_url(
                "https://www.google.com/maps/search/?api=1&query=x&query_place_id=ChIJLU7jZClu5kcR4PcOOO6p3I0"
            )
            .as_deref(),
            Some("ChIJLU7jZClu5kcR4PcOOO6p3I0")
        );
        assert_eq!(
            extract_place_id_from_url("https://maps.google.com/?q=place_id:ChIJabc").as_deref(),
            Some("ChIJabc")
        );
        assert_eq!(
            extract_place_id_from_url("https://www.google.com/maps/place/data=!4m2!1sChIJ123!2e1")
                .as_deref(),
            Some("ChIJ123")
        );
        assert_eq!(
            extract_place_id_from_url("https://www.google.com/maps/place/data=!1s0x1:0x2"),
            None
        );
    }

    #[test]
    fn unwraps_url_wrapper() {
        assert_eq!(
            unwrap_q_param(
                "https://www.google.com/url?sa=t&q=https%3A%2F%2Fwww.google.com%2Fmaps%2Fplace%2FX"
            )
            .as_deref(),
            Some("https://www.google.com/maps/place/X")
        );
        assert_eq!(unwrap_q_param("https://www.google.com/url?q=not-a-link"), None);
        assert_eq!(
            unwrap_q_param("https://www.google.com/search?q=https%3A%2F%2Fx.test"),
            None
        );
        assert_eq!(unwrap_q_param("garbage"), None);
    }

    #[test]
    fn place_id_shape() {
        assert!(is_place_id("ChIJLU7jZClu5kcR4PcOOO6p3I0"));
        assert!(!is_place_id("0x47e66e1f06e2b70f:0x40b82c3688c9460"));
        assert!(!is_place_id("ChIJ with space"));
    }
}
