//! HTML scanning: deobfuscation, candidate extraction, and scoring.

mod candidates;
mod deobfuscate;
mod fallback;
mod score;

pub use candidates::{extract_candidates, CandidateSet};
pub use deobfuscate::deobfuscate_html;
pub use fallback::{
    extract_app_link, extract_canonical, extract_location_assignment, extract_place_id_from_html,
};
pub use score::{score_candidate, select_best};

/// Best scored map URL found in `html`, if any.
#[must_use]
pub fn best_candidate(html: &str, base_url: &str) -> Option<String> {
    if html.is_empty() {
        return None;
    }
    select_best(&extract_candidates(html, base_url))
}

/// Any map URL the page points at, most specific source first: scored
/// candidates, canonical link, app-link meta, inline location assignment.
#[must_use]
pub fn locate_maps_url(html: &str, base_url: &str) -> Option<String> {
    if html.is_empty() {
        return None;
    }
    best_candidate(html, base_url)
        .or_else(|| extract_canonical(html))
        .or_else(|| extract_app_link(html))
        .or_else(|| extract_location_assignment(html, base_url))
}
