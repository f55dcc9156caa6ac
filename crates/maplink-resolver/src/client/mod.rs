//! Pooled HTTP clients shared by every network-bound strategy.

mod identity;

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION, REFERER};
use reqwest::{redirect, Client, Response, Url};

use crate::config::ResolverConfig;
use crate::error::ResolveError;

pub use identity::Identity;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const GOOGLE_REFERER: &str = "https://www.google.com/";

/// Whether a request lets the client chase redirects itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Up to the configured bridge redirect cap.
    Follow,
    /// Redirects disabled; the caller reads `Location` itself.
    Manual,
}

/// What a single GET produced.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the response was served from (after any automatic redirects).
    pub url: Url,
    pub status: u16,
    /// Raw `Location` header, when present.
    pub location: Option<String>,
    /// Textual body; empty for binary responses and for redirects.
    pub body: String,
}

/// Two process-wide clients: one following redirects, one not.
///
/// Built once and shared; `reqwest::Client` pools connections internally.
/// Non-2xx responses are not errors here: redirect pages and error pages
/// still carry useful `Location` headers and bodies.
#[derive(Debug, Clone)]
pub struct HttpClients {
    following: Client,
    manual: Client,
    accept_language: HeaderValue,
}

impl HttpClients {
    /// Builds both clients from the resolver configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Http`] if a `reqwest::Client` cannot be
    /// constructed (e.g. TLS backend initialization failure), or
    /// [`ResolveError::InvalidHeader`] for an unusable `accept-language`.
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let following = base_builder(config.request_timeout)
            .redirect(redirect::Policy::limited(config.bridge_max_redirects))
            .build()?;
        let manual = base_builder(config.request_timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            ResolveError::InvalidHeader {
                name: "accept-language",
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            following,
            manual,
            accept_language,
        })
    }

    /// Issues one GET with the identity's header set.
    ///
    /// In [`RedirectMode::Manual`] the request also carries a search-engine
    /// `referer`, and the body is only read when no `Location` is present.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Http`] on network failure, timeout, or when
    /// the redirect cap is exceeded.
    pub async fn fetch(
        &self,
        url: &str,
        identity: Identity,
        mode: RedirectMode,
    ) -> Result<FetchedPage, ResolveError> {
        let client = match mode {
            RedirectMode::Follow => &self.following,
            RedirectMode::Manual => &self.manual,
        };

        let mut request = client
            .get(url)
            .header(reqwest::header::USER_AGENT, identity.user_agent())
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.accept_language.clone())
            .header("upgrade-insecure-requests", "1");
        if mode == RedirectMode::Manual {
            request = request.header(REFERER, GOOGLE_REFERER);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let settled = response.url().clone();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = if location.is_some() && mode == RedirectMode::Manual {
            String::new()
        } else {
            read_text_body(response).await?
        };

        tracing::debug!(
            url,
            settled = %settled,
            status,
            has_location = location.is_some(),
            identity = identity.label(),
            "fetched page"
        );

        Ok(FetchedPage {
            url: settled,
            status,
            location,
            body,
        })
    }
}

fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
}

/// Reads the body when the response declares (or omits) a textual type.
async fn read_text_body(response: Response) -> Result<String, ResolveError> {
    let textual = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(is_textual_content_type);
    if !textual {
        return Ok(String::new());
    }
    Ok(response.text().await?)
}

fn is_textual_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    ["text", "html", "json", "javascript", "xml"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
