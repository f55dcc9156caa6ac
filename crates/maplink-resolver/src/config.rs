use std::path::PathBuf;
use std::time::Duration;

use maplink_core::AppConfig;

/// Settings for the headless browser fallback.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub enabled: bool,
    /// Explicit Chromium binary; `None` lets chromiumoxide auto-detect one.
    pub executable: Option<PathBuf>,
    pub nav_timeout: Duration,
    pub idle_timeout: Duration,
    /// Bound for the "open in browser" affordance click.
    pub click_timeout: Duration,
    /// Idle wait after a successful click.
    pub post_click_idle_timeout: Duration,
    pub accept_language: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            executable: None,
            nav_timeout: Duration::from_millis(15_000),
            idle_timeout: Duration::from_millis(5_000),
            click_timeout: Duration::from_millis(3_000),
            post_click_idle_timeout: Duration::from_millis(4_000),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

const DEFAULT_ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en;q=0.8";

/// Runtime configuration for [`crate::Resolver`].
///
/// The four endpoint bases default to the public provider hosts. Tests point
/// them at a local mock server.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base of the applink bridge (`?source=applink&link=…` is appended).
    pub applink_url: String,
    /// Base of the URL redirector bridge (`?sa=t&source=maps_applink&url=…`).
    pub redirector_url: String,
    /// Base of the CID lookup (`?cid=<decimal>`).
    pub cid_lookup_url: String,
    /// Base of the place-ID search (`?api=1&query_place_id=<id>`).
    pub place_search_url: String,
    pub request_timeout: Duration,
    pub bridge_max_redirects: usize,
    pub manual_max_hops: usize,
    pub accept_language: String,
    /// Short-link hosts recognized on top of the built-in list.
    pub extra_short_hosts: Vec<String>,
    pub browser: BrowserSettings,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            applink_url: "https://www.google.com/maps".to_string(),
            redirector_url: "https://www.google.com/url".to_string(),
            cid_lookup_url: "https://maps.google.com/".to_string(),
            place_search_url: "https://www.google.com/maps/search/".to_string(),
            request_timeout: Duration::from_secs(12),
            bridge_max_redirects: 6,
            manual_max_hops: 10,
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            extra_short_hosts: Vec::new(),
            browser: BrowserSettings::default(),
        }
    }
}

impl ResolverConfig {
    /// Derives resolver settings from the process-wide application config.
    ///
    /// Endpoint bases keep their provider defaults.
    #[must_use]
    pub fn from_app_config(app: &AppConfig) -> Self {
        let browser = BrowserSettings {
            enabled: app.browser_enabled,
            executable: app.browser_executable.clone(),
            nav_timeout: Duration::from_millis(app.browser_nav_timeout_ms),
            idle_timeout: Duration::from_millis(app.browser_idle_timeout_ms),
            accept_language: app.accept_language.clone(),
            ..BrowserSettings::default()
        };
        Self {
            request_timeout: Duration::from_secs(app.request_timeout_secs),
            bridge_max_redirects: app.bridge_max_redirects,
            manual_max_hops: app.manual_max_hops,
            accept_language: app.accept_language.clone(),
            extra_short_hosts: app.extra_short_hosts.clone(),
            browser,
            ..Self::default()
        }
    }
}
