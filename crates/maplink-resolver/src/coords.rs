//! Latitude/longitude extraction from map URLs and page text.

use std::borrow::Cow;
use std::sync::LazyLock;

use maplink_core::LatLng;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;

/// Query keys that may carry a `lat,lng` pair, in lookup order.
const QUERY_COORD_KEYS: [&str; 9] = [
    "q",
    "ll",
    "query",
    "center",
    "destination",
    "origin",
    "daddr",
    "saddr",
    "sll",
];

static POI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!3d(-?\d+(?:[.,]\d+)?)!4d(-?\d+(?:[.,]\d+)?)").expect("valid regex")
});
static POI_REVERSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!4d(-?\d+(?:[.,]\d+)?)!3d(-?\d+(?:[.,]\d+)?)").expect("valid regex")
});
// `@lat,lng[,zoom]` with `.` decimals. Integer coordinates (`@45,1,17z`)
// must not be read as comma decimals.
static CENTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:\.\d+)?),\s*(-?\d+(?:\.\d+)?)").expect("valid regex")
});
// Comma-decimal form, consulted only when the `.` form yields nothing valid.
static CENTER_COMMA_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:,\d+)?),\s*(-?\d+(?:,\d+)?)").expect("valid regex")
});
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)").expect("valid regex")
});
static PAIR_COMMA_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:,\d+)?)\s*,\s*(-?\d+(?:,\d+)?)").expect("valid regex")
});
// Viewport expressed as a radius in meters: `@lat,lng,1234m`.
static RADIUS_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[^/]*,\s*\d+(?:\.\d+)?m").expect("valid regex"));

const STREET_VIEW_MARKER: &str = "!1e3";
const PLACE_PATH_MARKER: &str = "/maps/place/";

/// Independent coordinate readings from one URL. Never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateCandidates {
    /// Point of interest from `!3d<lat>!4d<lng>` (or the reversed form).
    pub poi: Option<LatLng>,
    /// Viewport center from `@<lat>,<lng>`.
    pub center: Option<LatLng>,
    /// First coordinate-shaped value among [`QUERY_COORD_KEYS`].
    pub query: Option<LatLng>,
}

fn to_number(raw: &str) -> Option<f64> {
    raw.replacen(',', ".", 1).parse::<f64>().ok()
}

fn pair(lat: &str, lng: &str) -> Option<LatLng> {
    LatLng::new(to_number(lat)?, to_number(lng)?)
}

/// Last match of `dotted`, else last match of `comma_decimal`, that forms
/// a valid pair.
fn last_pair(text: &str, dotted: &Regex, comma_decimal: &Regex) -> Option<LatLng> {
    let last_valid = |re: &Regex| {
        re.captures_iter(text)
            .last()
            .and_then(|caps| pair(&caps[1], &caps[2]))
    };
    last_valid(dotted).or_else(|| last_valid(comma_decimal))
}

fn decode_once(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// POI marker alone: last `!3d..!4d..` match, else last `!4d..!3d..`.
///
/// Only the last match of the first form found is considered; an invalid
/// last match yields `None` rather than falling back to earlier ones.
#[must_use]
pub fn extract_poi_from_text(text: &str) -> Option<LatLng> {
    if let Some(caps) = POI_RE.captures_iter(text).last() {
        return pair(&caps[1], &caps[2]);
    }
    POI_REVERSED_RE
        .captures_iter(text)
        .last()
        .and_then(|caps| pair(&caps[2], &caps[1]))
}

fn query_coords(decoded: &str) -> Option<LatLng> {
    let url = Url::parse(decoded).ok()?;
    QUERY_COORD_KEYS.iter().find_map(|&key| {
        let (_, value) = url.query_pairs().find(|(k, _)| k == key)?;
        let value = decode_once(&value).into_owned();
        let first_valid = |re: &Regex| {
            re.captures(&value)
                .and_then(|caps| pair(&caps[1], &caps[2]))
        };
        first_valid(&PAIR_RE).or_else(|| first_valid(&PAIR_COMMA_DECIMAL_RE))
    })
}

/// Reads every coordinate slot from a URL.
///
/// The text is percent-decoded once first; undecodable input is scanned raw.
#[must_use]
pub fn coordinate_candidates(url: &str) -> CoordinateCandidates {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return CoordinateCandidates::default();
    }
    let decoded = decode_once(trimmed);

    let center = last_pair(&decoded, &CENTER_RE, &CENTER_COMMA_DECIMAL_RE);

    CoordinateCandidates {
        poi: extract_poi_from_text(&decoded),
        center,
        query: query_coords(&decoded),
    }
}

/// Picks one coordinate pair out of a map URL.
///
/// A place page with a POI answers with the POI. Otherwise the center is
/// tried first when `prefer_center` is set, or when there is no POI and the
/// URL shows a radius viewport or street-view marker. Default order is
/// POI, center, query.
#[must_use]
pub fn parse_lat_lng(url: &str, prefer_center: bool) -> Option<LatLng> {
    let found = coordinate_candidates(url);

    if url.contains(PLACE_PATH_MARKER) {
        if let Some(poi) = found.poi {
            return Some(poi);
        }
    }

    let center_hint = found.poi.is_none()
        && ((found.center.is_some() && RADIUS_MARKER_RE.is_match(url))
            || url.contains(STREET_VIEW_MARKER));

    if prefer_center || center_hint {
        found.center.or(found.poi).or(found.query)
    } else {
        found.poi.or(found.center).or(found.query)
    }
}

#[cfg(test)]
#[path = "coords_test.rs"]
mod tests;
