use std::sync::LazyLock;

use regex::Regex;

use super::candidates::CandidateSet;
use crate::classify::looks_like_long_maps_url;

static POI_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!3d|!4d").expect("valid regex"));
static CENTER_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@[+-]?\d+(?:\.\d+)?,[+-]?\d+(?:\.\d+)?").expect("valid regex")
});

/// Ranks a candidate by how much location detail it carries.
#[must_use]
pub fn score_candidate(url: &str) -> u32 {
    let mut score = 0;
    if url.contains("/maps/place/") {
        score += 10;
    }
    if POI_MARKER_RE.is_match(url) {
        score += 5;
    }
    if CENTER_MARKER_RE.is_match(url) {
        score += 2;
    }
    score
}

/// Highest-scoring long-form map URL; ties keep the earliest candidate.
#[must_use]
pub fn select_best(candidates: &CandidateSet) -> Option<String> {
    let mut best: Option<(&str, u32)> = None;
    for url in candidates.urls().filter(|u| looks_like_long_maps_url(u)) {
        let score = score_candidate(url);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((url, score));
        }
    }
    best.map(|(url, _)| url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(urls: &[&str]) -> CandidateSet {
        let mut set = CandidateSet::new();
        for url in urls {
            set.insert((*url).to_string());
        }
        set
    }

    #[test]
    fn scores_each_marker() {
        assert_eq!(score_candidate("https://www.google.com/maps"), 0);
        assert_eq!(score_candidate("https://www.google.com/maps/place/X"), 10);
        assert_eq!(score_candidate("https://www.google.com/maps/@1.5,2.5,3z"), 2);
        assert_eq!(
            score_candidate("https://www.google.com/maps/place/X/@1.5,2.5,3z/data=!3d1.5!4d2.5"),
            17
        );
    }

    #[test]
    fn picks_the_richest_candidate() {
        let set = set_of(&[
            "https://www.google.com/maps/search/cafe",
            "https://www.google.com/maps/place/Cafe/@1.5,2.5,17z",
            "https://www.google.com/maps/@1.5,2.5,17z",
        ]);
        assert_eq!(
            select_best(&set).as_deref(),
            Some("https://www.google.com/maps/place/Cafe/@1.5,2.5,17z")
        );
    }

    #[test]
    fn ties_keep_first_seen() {
        let set = set_of(&[
            "https://www.google.com/maps/place/First",
            "https://www.google.com/maps/place/Second",
        ]);
        assert_eq!(
            select_best(&set).as_deref(),
            Some("https://www.google.com/maps/place/First")
        );
    }

    #[test]
    fn non_map_hosts_are_ignored() {
        let set = set_of(&[
            "https://example.com/maps/place/X/@1.5,2.5,17z",
            "https://maps.app.goo.gl/maps/place/Y",
        ]);
        assert_eq!(select_best(&set), None);
        assert_eq!(select_best(&CandidateSet::new()), None);
    }

    #[test]
    fn zero_score_long_url_still_qualifies() {
        let set = set_of(&["https://www.google.com/maps?cid=123"]);
        assert_eq!(
            select_best(&set).as_deref(),
            Some("https://www.google.com/maps?cid=123")
        );
    }
}
