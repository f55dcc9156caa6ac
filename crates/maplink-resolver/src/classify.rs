//! Cheap textual checks on URLs. None of these touch the network.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

/// Built-in short-link domains. Subdomains match too.
pub const SHORT_LINK_HOSTS: [&str; 4] = ["maps.app.goo.gl", "goo.gl", "goo.gle", "g.page"];

static AT_COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@-?\d+(?:\.\d+)?,-?\d+(?:\.\d+)?").expect("valid regex"));
static POI_COORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!3d-?\d+(?:\.\d+)?!4d-?\d+(?:\.\d+)?").expect("valid regex")
});

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(str::to_ascii_lowercase)
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True when `url` is on a built-in short-link domain.
#[must_use]
pub fn is_short_link(url: &str) -> bool {
    is_short_link_with(url, &[])
}

/// Like [`is_short_link`], also accepting `extra_hosts` (lowercase).
#[must_use]
pub fn is_short_link_with(url: &str, extra_hosts: &[String]) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    SHORT_LINK_HOSTS
        .iter()
        .copied()
        .chain(extra_hosts.iter().map(String::as_str))
        .any(|domain| host_matches(&host, domain))
}

/// A parseable URL on a `google.*` host whose text mentions `/maps`.
#[must_use]
pub fn looks_like_long_maps_url(url: &str) -> bool {
    host_of(url).is_some_and(|host| host.contains("google.")) && url.contains("/maps")
}

/// Whether the URL already carries `@lat,lng` or `!3d…!4d…` coordinates.
#[must_use]
pub fn has_coords(url: &str) -> bool {
    AT_COORDS_RE.is_match(url) || POI_COORDS_RE.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_built_in_short_hosts() {
        assert!(is_short_link("https://maps.app.goo.gl/AbCdEf123"));
        assert!(is_short_link("https://goo.gl/maps/xyz"));
        assert!(is_short_link("https://goo.gle/3abc"));
        assert!(is_short_link("https://g.page/some-business"));
        assert!(is_short_link("HTTPS://MAPS.APP.GOO.GL/AbC"));
    }

    #[test]
    fn subdomains_match_but_lookalikes_do_not() {
        assert!(is_short_link("https://www.goo.gl/abc"));
        assert!(!is_short_link("https://notgoo.gl/abc"));
        assert!(!is_short_link("https://g.page.evil.com/abc"));
    }

    #[test]
    fn long_urls_and_garbage_are_not_short() {
        assert!(!is_short_link("https://www.google.com/maps/place/X"));
        assert!(!is_short_link("not a url"));
        assert!(!is_short_link(""));
    }

    #[test]
    fn extra_hosts_extend_the_list() {
        let extra = vec!["lnk.example".to_string()];
        assert!(is_short_link_with("https://lnk.example/a", &extra));
        assert!(!is_short_link("https://lnk.example/a"));
    }

    #[test]
    fn long_maps_url_needs_google_host_and_maps_path() {
        assert!(looks_like_long_maps_url("https://www.google.com/maps/place/X"));
        assert!(looks_like_long_maps_url("https://maps.google.fr/maps?q=1,2"));
        assert!(!looks_like_long_maps_url("https://example.com/maps/place/X"));
        assert!(!looks_like_long_maps_url("https://www.google.com/search?q=x"));
        assert!(!looks_like_long_maps_url("/maps/place/X"));
    }

    #[test]
    fn detects_embedded_coordinates() {
        assert!(has_coords("https://www.google.com/maps/@48.85,2.29,17z"));
        assert!(has_coords("https://www.google.com/maps/place/X/data=!3d48.85!4d2.29"));
        assert!(!has_coords("https://www.google.com/maps/place/X"));
    }
}
