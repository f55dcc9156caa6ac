//! Single-shot extractors tried when candidate scoring finds nothing.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;

use crate::opaque::is_place_id;

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']canonical["'][^>]+href=["']([^"']+)["']"#)
        .expect("valid regex")
});
static AL_ANDROID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']al:android:url["'][^>]+content=["']([^"']+)["']"#)
        .expect("valid regex")
});
static AL_IOS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']al:ios:url["'][^>]+content=["']([^"']+)["']"#)
        .expect("valid regex")
});
static LOCATION_ABSOLUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:window\.)?location(?:\.href)?\s*=\s*['"](https?://[^"']+)['"]"#)
        .expect("valid regex")
});
static LOCATION_RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:window\.)?location(?:\.href)?\s*=\s*['"]((?:/|\.{1,2}/)[^"']+)['"]"#)
        .expect("valid regex")
});
static QUERY_PLACE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)query_place_id=([^&"'<>\s]+)"#).expect("valid regex")
});
static PLACE_ID_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)place_id(?:%3A|:)(ChI[0-9A-Za-z_-]+)").expect("valid regex")
});
static DATA_PLACE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!1s([^!]+)").expect("valid regex"));

/// `<link rel="canonical" href="…">` target.
#[must_use]
pub fn extract_canonical(html: &str) -> Option<String> {
    CANONICAL_RE
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// App-link meta target, Android first, kept only when it points at `/maps`.
#[must_use]
pub fn extract_app_link(html: &str) -> Option<String> {
    [&*AL_ANDROID_RE, &*AL_IOS_RE].into_iter().find_map(|re| {
        re.captures(html)
            .map(|caps| caps[1].to_string())
            .filter(|url| url.contains("/maps"))
    })
}

/// Target of an inline `window.location[.href] = '…'` assignment.
///
/// Absolute targets win over relative ones; relative targets are resolved
/// against `base_url`. An unresolvable target is returned verbatim.
#[must_use]
pub fn extract_location_assignment(html: &str, base_url: &str) -> Option<String> {
    let target = LOCATION_ABSOLUTE_RE
        .captures(html)
        .or_else(|| LOCATION_RELATIVE_RE.captures(html))
        .map(|caps| caps[1].to_string())?;
    let resolved = Url::parse(base_url)
        .and_then(|base| base.join(&target))
        .map_or(target, String::from);
    Some(resolved)
}

/// A `ChI…` place ID embedded anywhere in the page.
#[must_use]
pub fn extract_place_id_from_html(html: &str) -> Option<String> {
    if let Some(caps) = QUERY_PLACE_ID_RE.captures(html) {
        let raw = &caps[1];
        return Some(
            percent_decode_str(raw)
                .decode_utf8()
                .map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned),
        );
    }
    if let Some(caps) = PLACE_ID_TOKEN_RE.captures(html) {
        return Some(caps[1].to_string());
    }
    let caps = DATA_PLACE_ID_RE.captures(html)?;
    let decoded = percent_decode_str(&caps[1]).decode_utf8().ok()?;
    is_place_id(&decoded).then(|| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_canonical_link() {
        let html = r#"<link rel="canonical" href="https://www.google.com/maps/place/Canon">"#;
        assert_eq!(
            extract_canonical(html).as_deref(),
            Some("https://www.google.com/maps/place/Canon")
        );
        assert_eq!(extract_canonical("<p>none</p>"), None);
    }

    #[test]
    fn app_link_prefers_android_and_requires_maps() {
        let html = concat!(
            r#"<meta property="al:ios:url" content="comgooglemaps://maps/place/Ios">"#,
            r#"<meta property="al:android:url" content="intent://maps/place/Android">"#,
        );
        assert_eq!(
            extract_app_link(html).as_deref(),
            Some("intent://maps/place/Android")
        );

        let html = r#"<meta property="al:android:url" content="intent://other">"#;
        assert_eq!(extract_app_link(html), None);
    }

    #[test]
    fn location_assignment_absolute_and_relative() {
        let html = r#"<script>window.location.href = "https://www.google.com/maps/place/Abs";</script>"#;
        assert_eq!(
            extract_location_assignment(html, "https://maps.app.goo.gl/x").as_deref(),
            Some("https://www.google.com/maps/place/Abs")
        );

        let html = r"<script>location = '/maps/place/Rel';</script>";
        assert_eq!(
            extract_location_assignment(html, "https://www.google.com/start").as_deref(),
            Some("https://www.google.com/maps/place/Rel")
        );

        assert_eq!(extract_location_assignment("<p/>", "https://x.test/"), None);
    }

    #[test]
    fn place_id_sources_in_order() {
        assert_eq!(
            extract_place_id_from_html("…?api=1&query_place_id=ChIJabc%2D123&x").as_deref(),
            Some("ChIJabc-123")
        );
        assert_eq!(
            extract_place_id_from_html(r#"{"ref":"place_id:ChIJxyz_9"}"#).as_deref(),
            Some("ChIJxyz_9")
        );
        assert_eq!(
            extract_place_id_from_html("data=!4m2!1sChIJdata42!2m1").as_deref(),
            Some("ChIJdata42")
        );
        assert_eq!(extract_place_id_from_html("data=!1s0x47e66e:0x8ddca!2m1"), None);
    }
}
