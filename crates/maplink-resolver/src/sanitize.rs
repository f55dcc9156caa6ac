//! URL sanitization and visual-center anchoring.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use reqwest::Url;

/// Query keys that carry tracking, locale or session hints rather than location.
const TRACKING_PARAMS: [&str; 13] = [
    "ts",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "entry",
    "g_ep",
    "hl",
    "ved",
    "source",
    "opi",
    "sca_esv",
];

/// Default zoom written by [`ensure_at_center`].
pub const DEFAULT_ZOOM: u32 = 17;

const FALLBACK_MAPS_ORIGIN: &str = "https://www.google.com/maps";

static DUPLICATE_SLASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("valid regex"));
static DATA_BLOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/data=![^/?#]*").expect("valid regex"));
static AT_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@-?\d+(?:\.\d+)?,-?\d+(?:\.\d+)?(?:,[^/?#]+)?").expect("valid regex")
});

/// Removes ASCII control characters (`U+0000..=U+001F` and `U+007F`).
#[must_use]
pub fn strip_control(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_control()).collect()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key)
}

fn trim_dangling(s: &str) -> &str {
    s.trim_end_matches(['?', '#'])
}

/// Strips tracking parameters and `data=!…` blobs from a map URL.
///
/// Input that does not parse as an absolute URL is only stripped of
/// control characters and a dangling `?`/`#`.
#[must_use]
pub fn sanitize_url(raw: &str) -> String {
    let stripped = strip_control(raw);
    let Ok(mut url) = Url::parse(&stripped) else {
        return trim_dangling(&stripped).to_owned();
    };

    let has_tracking = url
        .query_pairs()
        .any(|(key, _)| is_tracking_param(&key));
    if has_tracking {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    let collapsed = DUPLICATE_SLASHES_RE.replace_all(url.path(), "/");
    let cleaned_path = DATA_BLOB_RE.replace_all(&collapsed, "").into_owned();
    if cleaned_path != url.path() {
        url.set_path(&cleaned_path);
    }

    trim_dangling(&strip_control(url.as_str())).to_owned()
}

/// Rewrites (or appends) the `@lat,lng,{zoom}z` visual-center segment.
///
/// The URL is sanitized first. An existing `@lat,lng[,…]` segment is
/// replaced in place; a `/maps` path without one gets the segment appended
/// before its query and fragment; anything else becomes a bare map URL
/// centered on the coordinates. Non-finite coordinates leave the sanitized
/// URL untouched.
#[must_use]
pub fn ensure_at_center(url: &str, lat: f64, lng: f64, zoom: u32) -> String {
    let cleaned = sanitize_url(url);
    if !lat.is_finite() || !lng.is_finite() {
        return cleaned;
    }

    let anchor = format!("@{lat},{lng},{zoom}z");
    if AT_SEGMENT_RE.is_match(&cleaned) {
        return AT_SEGMENT_RE
            .replace(&cleaned, NoExpand(&anchor))
            .into_owned();
    }

    if let Ok(parsed) = Url::parse(&cleaned) {
        if parsed.path().contains("/maps") {
            let origin_and_path =
                format!("{}{}", parsed.origin().ascii_serialization(), parsed.path());
            let base = origin_and_path.trim_end_matches('/');
            let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
            let fragment = parsed
                .fragment()
                .map(|f| format!("#{f}"))
                .unwrap_or_default();
            return format!("{base}/{anchor}{query}{fragment}");
        }
    }

    format!("{FALLBACK_MAPS_ORIGIN}/{anchor}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tracking_params_and_keeps_the_rest() {
        let out = sanitize_url(
            "https://www.google.com/maps/place/Cafe?hl=fr&q=cafe&utm_source=share&entry=ttu",
        );
        assert_eq!(out, "https://www.google.com/maps/place/Cafe?q=cafe");
    }

    #[test]
    fn drops_query_entirely_when_only_tracking_params() {
        let out = sanitize_url("https://www.google.com/maps/place/Cafe?entry=ttu&g_ep=abc");
        assert_eq!(out, "https://www.google.com/maps/place/Cafe");
    }

    #[test]
    fn removes_data_blob_and_duplicate_slashes() {
        let out = sanitize_url(
            "https://www.google.com//maps//place/X/@36.75,3.06,17z/data=!3m1!4b1!4m6!3d36.75!4d3.06",
        );
        assert_eq!(out, "https://www.google.com/maps/place/X/@36.75,3.06,17z");
    }

    #[test]
    fn removes_data_blob_in_the_middle_of_a_path() {
        let out = sanitize_url("https://www.google.com/maps/place/X/data=!4m2!3m1/am=t");
        assert_eq!(out, "https://www.google.com/maps/place/X/am=t");
    }

    #[test]
    fn strips_control_characters_and_dangling_markers() {
        let out = sanitize_url("https://www.google.com/maps/place/X\n?#");
        assert_eq!(out, "https://www.google.com/maps/place/X");
    }

    #[test]
    fn unparseable_input_only_loses_control_chars() {
        assert_eq!(sanitize_url("not a url\t?"), "not a url");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "https://www.google.com/maps/place/X/@1.5,2.5,17z/data=!3d1.5!4d2.5?hl=fr&q=a+b",
            "https://maps.app.goo.gl/abc123?g_st=ic",
            "https://www.google.com//maps/search/caf%C3%A9?entry=ttu#",
            "https://www.google.com/maps?q=48.85,2.29&ts=123&utm_source=x",
            "garbage ?#",
            "",
            "https://www.google.com/maps/place/X?#",
        ];
        for input in inputs {
            let once = sanitize_url(input);
            let twice = sanitize_url(&once);
            assert_eq!(once, twice, "sanitize not idempotent for {input}");
        }
    }

    #[test]
    fn ensure_at_center_replaces_existing_segment() {
        let out = ensure_at_center(
            "https://www.google.com/maps/place/X/@10.0,20.0,12z/data=!3d1!4d2",
            36.75,
            3.06,
            DEFAULT_ZOOM,
        );
        assert_eq!(out, "https://www.google.com/maps/place/X/@36.75,3.06,17z");
    }

    #[test]
    fn ensure_at_center_appends_before_query() {
        let out = ensure_at_center(
            "https://www.google.com/maps/place/X/?q=cafe#frag",
            36.75,
            3.06,
            15,
        );
        assert_eq!(
            out,
            "https://www.google.com/maps/place/X/@36.75,3.06,15z?q=cafe#frag"
        );
    }

    #[test]
    fn ensure_at_center_builds_bare_map_url_for_non_map_input() {
        let out = ensure_at_center("https://example.com/where", 48.85, 2.29, DEFAULT_ZOOM);
        assert_eq!(out, "https://www.google.com/maps/@48.85,2.29,17z");
    }

    #[test]
    fn ensure_at_center_ignores_non_finite_coordinates() {
        let out = ensure_at_center(
            "https://www.google.com/maps/place/X?hl=fr",
            f64::NAN,
            2.0,
            DEFAULT_ZOOM,
        );
        assert_eq!(out, "https://www.google.com/maps/place/X");
    }

    #[test]
    fn ensure_at_center_twice_keeps_a_single_anchor() {
        let url = "https://www.google.com/maps/place/Cafe+de+Flore";
        let once = ensure_at_center(url, 48.854, 2.3325, DEFAULT_ZOOM);
        let twice = ensure_at_center(&once, 48.854, 2.3325, DEFAULT_ZOOM);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("@48.854,2.3325,17z").count(), 1);
        assert_eq!(twice.matches('@').count(), 1);
    }
}
