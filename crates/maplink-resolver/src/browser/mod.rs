//! Headless browser fallback.
//!
//! The pipeline talks to a [`PageRenderer`]; production uses
//! [`ChromiumRenderer`], tests substitute a fake.

mod chromium;

use std::future::Future;

use thiserror::Error;

pub use chromium::ChromiumRenderer;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    Chromium(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

/// Settled state of a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL the page settled on after scripts and redirects ran.
    pub url: String,
    /// Rendered document markup.
    pub html: String,
}

/// Loads a URL in a real browser and reports where it settled.
///
/// Implementations own the browser lifecycle: whatever they launch for a
/// call is released before the returned future completes or is dropped.
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &str) -> impl Future<Output = Result<RenderedPage, BrowserError>> + Send;
}
