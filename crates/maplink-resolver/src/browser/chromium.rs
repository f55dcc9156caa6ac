//! Chromium-backed renderer using chromiumoxide.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{BrowserError, PageRenderer, RenderedPage};
use crate::client::Identity;
use crate::config::BrowserSettings;

fn chromium_error(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Chromium(e.to_string())
}

/// Launches an isolated headless Chromium per [`PageRenderer::render`] call.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    settings: BrowserSettings,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage, BrowserError> {
        let session = BrowserSession::launch(&self.settings).await?;
        let outcome = session.visit(url, &self.settings).await;
        session.close().await;
        outcome
    }
}

/// One browser process and its CDP event pump.
///
/// [`BrowserSession::close`] shuts down gracefully. If the session is dropped
/// without it (error path, timeout, or the caller's future being cancelled)
/// the drop guard stops the event pump and `Browser`'s own drop kills the
/// child process.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl BrowserSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions");
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BrowserError::Chromium)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(chromium_error)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium handler event error");
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            closed: false,
        })
    }

    async fn visit(
        &self,
        url: &str,
        settings: &BrowserSettings,
    ) -> Result<RenderedPage, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(chromium_error)?;

        let identity = SetUserAgentOverrideParams::builder()
            .user_agent(Identity::Mobile.user_agent())
            .accept_language(settings.accept_language.clone())
            .build()
            .map_err(BrowserError::Chromium)?;
        page.set_user_agent(identity).await.map_err(chromium_error)?;

        match tokio::time::timeout(settings.nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(BrowserError::Navigation(e.to_string())),
            Err(_) => {
                return Err(BrowserError::Timeout(format!(
                    "navigation exceeded {}ms",
                    settings.nav_timeout.as_millis()
                )))
            }
        }

        wait_for_network_idle(&page, settings.idle_timeout).await;

        if click_open_in_browser(&page, settings.click_timeout).await {
            tracing::debug!(url, "clicked open-in-browser affordance");
            wait_for_network_idle(&page, settings.post_click_idle_timeout).await;
        }

        let settled = page
            .url()
            .await
            .map_err(chromium_error)?
            .unwrap_or_else(|| url.to_owned());
        let html = page.content().await.map_err(chromium_error)?;

        Ok(RenderedPage { url: settled, html })
    }

    /// Graceful shutdown bounded by [`CLOSE_TIMEOUT`]. When the browser does
    /// not exit in time the session is left to the drop guard.
    async fn close(mut self) {
        let browser = &mut self.browser;
        let graceful = async move {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "failed to close chromium");
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!(error = %e, "failed to reap chromium process");
            }
        };
        self.closed = finish_within(CLOSE_TIMEOUT, graceful).await;
    }
}

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs `work` to completion unless `limit` elapses first.
async fn finish_within(limit: Duration, work: impl Future<Output = ()>) -> bool {
    if tokio::time::timeout(limit, work).await.is_ok() {
        true
    } else {
        tracing::warn!(
            limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            "chromium did not shut down in time"
        );
        false
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
        if !self.closed {
            tracing::warn!("browser session dropped before close; killing chromium");
        }
    }
}

/// Polls the resource timeline until it stops growing for one second or
/// `timeout` elapses. Timing out is not an error.
async fn wait_for_network_idle(page: &Page, timeout: Duration) {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let js = format!(
        r"(async () => {{
            const timeoutMs = {timeout_ms};
            const idleMs = 1000;
            const interval = 250;
            const start = Date.now();
            let lastCount = 0;
            let stableMs = 0;
            try {{ lastCount = performance.getEntriesByType('resource').length; }} catch (_) {{}}
            while (Date.now() - start < timeoutMs) {{
                await new Promise(r => setTimeout(r, interval));
                let count = lastCount;
                try {{ count = performance.getEntriesByType('resource').length; }} catch (_) {{}}
                if (document.readyState === 'complete' && count === lastCount) {{
                    stableMs += interval;
                    if (stableMs >= idleMs) return true;
                }} else {{
                    stableMs = 0;
                }}
                lastCount = count;
            }}
            return false;
        }})()"
    );

    let bound = timeout + Duration::from_millis(500);
    match tokio::time::timeout(bound, page.evaluate(js)).await {
        Ok(Ok(result)) => {
            let idle = result.into_value::<bool>().unwrap_or(false);
            tracing::debug!(idle, timeout_ms, "network idle wait finished");
        }
        Ok(Err(e)) => tracing::debug!(error = %e, "network idle probe failed"),
        Err(_) => tracing::debug!(timeout_ms, "network idle probe timed out"),
    }
}

/// Clicks the first visible link or button whose text mentions "browser" or
/// "web". Returns whether something was clicked.
async fn click_open_in_browser(page: &Page, timeout: Duration) -> bool {
    const CLICK_JS: &str = r"(() => {
        const nodes = document.querySelectorAll('a, button, [role=button]');
        for (const node of nodes) {
            const text = (node.innerText || node.textContent || '').trim();
            if (/browser|web/i.test(text)) {
                node.click();
                return true;
            }
        }
        return false;
    })()";

    match tokio::time::timeout(timeout, page.evaluate(CLICK_JS)).await {
        Ok(Ok(result)) => result.into_value::<bool>().unwrap_or(false),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "open-in-browser click failed");
            false
        }
        Err(_) => false,
    }
}
