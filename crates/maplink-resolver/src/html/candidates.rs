use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use reqwest::Url;

use crate::opaque::unwrap_q_param;
use crate::sanitize::strip_control;

/// Turns one regex match into zero or more raw candidate URLs.
type Transform = fn(&Captures<'_>) -> Vec<String>;

struct Pattern {
    name: &'static str,
    regex: Regex,
    transform: Transform,
}

impl Pattern {
    fn new(name: &'static str, pattern: &str, transform: Transform) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("valid candidate regex"),
            transform,
        }
    }
}

fn whole_match(caps: &Captures<'_>) -> Vec<String> {
    vec![caps[0].to_string()]
}

fn first_group(caps: &Captures<'_>) -> Vec<String> {
    vec![caps[1].to_string()]
}

fn protocol_relative(caps: &Captures<'_>) -> Vec<String> {
    vec![format!("https:{}", &caps[1])]
}

fn percent_encoded(caps: &Captures<'_>) -> Vec<String> {
    let Ok(once) = percent_decode_str(&caps[0]).decode_utf8() else {
        return Vec::new();
    };
    let mut out = vec![once.to_string()];
    if let Ok(twice) = percent_decode_str(&once).decode_utf8() {
        out.push(twice.into_owned());
    }
    out
}

fn backslash_escaped(caps: &Captures<'_>) -> Vec<String> {
    vec![caps[0].replace("\\/", "/")]
}

static HEX_BYTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\x([0-9A-Fa-f]{2})").expect("valid regex"));

fn hex_escaped(caps: &Captures<'_>) -> Vec<String> {
    let decoded = HEX_BYTE_RE.replace_all(&caps[0], |inner: &Captures<'_>| {
        u8::from_str_radix(&inner[1], 16)
            .map(|b| char::from(b).to_string())
            .unwrap_or_default()
    });
    vec![decoded.into_owned()]
}

fn outer_redirect(caps: &Captures<'_>) -> Vec<String> {
    unwrap_q_param(&caps[0]).into_iter().collect()
}

/// Ordered pattern table. Every pattern runs; order only affects which
/// duplicate is seen first.
static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(
            "absolute",
            r#"(?i)https?://(?:www\.)?google\.[^"' >]+/maps[^\s"'<>]*"#,
            whole_match,
        ),
        Pattern::new(
            "protocol_relative",
            r#"(?i)["'](//(?:www\.)?google\.[^"' >]+/maps[^"']*)["']"#,
            protocol_relative,
        ),
        Pattern::new("root_relative", r#"["'](/maps/[^"']*)["']"#, first_group),
        Pattern::new(
            "percent_encoded",
            r#"(?i)https?%3A%2F%2F(?:www\.)?google\.[0-9A-Za-z_.%-]*%2Fmaps[^"'<>]*"#,
            percent_encoded,
        ),
        Pattern::new(
            "backslash_escaped",
            r#"(?i)https:\\/\\/(?:www\.)?google\.[^"' >]+\\/maps[^\s"'<>]*"#,
            backslash_escaped,
        ),
        Pattern::new(
            "hex_escaped",
            r#"(?i)https\\x3A\\x2F\\x2F(?:www\.)?google\.[^"' >]+\\x2Fmaps[^\s"'<>]*"#,
            hex_escaped,
        ),
        Pattern::new(
            "outer_redirect",
            r#"(?i)https?://www\.google\.[^"' >]+/url\?[^"' >]+"#,
            outer_redirect,
        ),
        Pattern::new(
            "meta_refresh",
            r#"(?i)<meta[^>]+http-equiv=["']refresh["'][^>]+content=["'][^"']*url=([^"']+)"#,
            first_group,
        ),
        Pattern::new(
            "og_url",
            r#"(?i)<meta[^>]+property=["']og:url["'][^>]+content=["']([^"']+)["']"#,
            first_group,
        ),
        Pattern::new(
            "app_link",
            r#"(?i)<meta[^>]+property=["']al:(?:android|ios):url["'][^>]+content=["']([^"']+)["']"#,
            first_group,
        ),
        Pattern::new(
            "anchor_href",
            r#"(?i)href=["'](https?://(?:www\.)?google\.[^"']+/maps[^"']*)["']"#,
            first_group,
        ),
        Pattern::new(
            "location_call",
            r#"(?i)location\.(?:assign|replace)\(\s*["'](https?://[^"']+/maps[^"']*)["']\s*\)"#,
            first_group,
        ),
    ]
});

/// Unique absolute URLs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    urls: Vec<String>,
}

impl CandidateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url`; returns `false` when it was already present.
    pub fn insert(&mut self, url: String) -> bool {
        if self.urls.contains(&url) {
            return false;
        }
        self.urls.push(url);
        true
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn resolve_against(raw: &str, base: Option<&Url>) -> Option<String> {
    let cleaned = strip_control(raw);
    let resolved = match base {
        Some(base) => base.join(&cleaned),
        None => Url::parse(&cleaned),
    };
    resolved.ok().map(String::from)
}

/// Collects every plausible map URL in `html`, resolved against `base_url`.
///
/// Matches that do not resolve to an absolute URL are dropped.
#[must_use]
pub fn extract_candidates(html: &str, base_url: &str) -> CandidateSet {
    let base = Url::parse(base_url).ok();
    let mut set = CandidateSet::new();
    for pattern in PATTERNS.iter() {
        let mut hits = 0usize;
        for caps in pattern.regex.captures_iter(html) {
            for raw in (pattern.transform)(&caps) {
                if let Some(url) = resolve_against(&raw, base.as_ref()) {
                    if set.insert(url) {
                        hits += 1;
                    }
                }
            }
        }
        if hits > 0 {
            tracing::trace!(pattern = pattern.name, hits, "candidate pattern matched");
        }
    }
    set
}

#[cfg(test)]
#[path = "candidates_test.rs"]
mod tests;
