use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, CookieParam, CookieSameSite, SetCookiesParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use log::debug;
use tokio::time::{sleep, Instant};

use crate::browser::driver::{PanelDriver, SessionCookie, WaitOutcome};
use crate::browser::errors::DriverError;
use crate::config::settings::BrowserOptions;

/// How often polled waits re-check the page.
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Grace period after a page load so client-side redirects can land before
/// the caller inspects the URL.
const NAVIGATION_SETTLE: Duration = Duration::from_millis(1000);

/// The production `PanelDriver`: one headless Chrome process with a single
/// page, driven over the DevTools protocol.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    // Held so the throwaway profile outlives the browser process.
    _profile_dir: tempfile::TempDir,
}

impl ChromeDriver {
    /// Launch a browser with a fresh temporary profile so no cookies or
    /// cached state leak between runs.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, DriverError> {
        let profile_dir = tempfile::tempdir()?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .arg("--disable-dev-shm-usage")
            .user_data_dir(profile_dir.path());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        // The handler stream must be drained for the CDP connection to
        // make progress; it ends when the browser shuts down.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser.new_page("about:blank").await?;

        // The panel serves the same markup either way, but don't advertise
        // the automation to it.
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            "Object.defineProperty(navigator, 'webdriver', { get: () => false });".to_string(),
        ))
        .await?;

        Ok(ChromeDriver {
            browser,
            page,
            handler_task,
            _profile_dir: profile_dir,
        })
    }

    /// Shut the browser down and reap the child process.
    pub async fn close(mut self) -> Result<(), DriverError> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }

    /// Runs `js` and deserializes its completion value, treating an
    /// undeserializable result as `default`.
    async fn eval_or<T>(&self, js: String, default: T) -> Result<T, DriverError>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self.page.evaluate(js).await?;
        Ok(result.into_value::<T>().unwrap_or(default))
    }

    /// One visibility check of `selector`: "missing", "hidden" or "visible".
    async fn probe_selector(&self, selector: &str) -> Result<String, DriverError> {
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector('{selector}');
                if (!el) return 'missing';
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                if (rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none') {{
                    return 'visible';
                }}
                return 'hidden';
            }})()
            "#,
            selector = js_quote(selector),
        );
        self.eval_or(js, "missing".to_string()).await
    }

    /// Same check for a `<button>` matched by visible label substring,
    /// which CSS selectors cannot express.
    async fn probe_button(&self, label: &str) -> Result<String, DriverError> {
        let js = format!(
            r#"
            (function() {{
                const button = Array.from(document.querySelectorAll('button'))
                    .find(b => (b.innerText || b.textContent || '').trim().includes('{label}'));
                if (!button) return 'missing';
                const rect = button.getBoundingClientRect();
                const style = window.getComputedStyle(button);
                if (rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none') {{
                    return 'visible';
                }}
                return 'hidden';
            }})()
            "#,
            label = js_quote(label),
        );
        self.eval_or(js, "missing".to_string()).await
    }
}

#[async_trait]
impl PanelDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        debug!("navigate: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(format!("{url}: {e}")))?;
        sleep(NAVIGATION_SETTLE).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.page
            .url()
            .await?
            .ok_or_else(|| DriverError::Protocol("page reported no URL".into()))
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector('{selector}');
                if (!el) return false;
                el.focus();
                el.value = '{value}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            selector = js_quote(selector),
            value = js_quote(value),
        );
        if self.eval_or(js, false).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(format!("selector: {selector}")))
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector('{selector}');
                if (el) {{ el.click(); return true; }}
                return false;
            }})()
            "#,
            selector = js_quote(selector),
        );
        if self.eval_or(js, false).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(format!("selector: {selector}")))
        }
    }

    async fn click_button(&self, label: &str) -> Result<(), DriverError> {
        let js = format!(
            r#"
            (function() {{
                const button = Array.from(document.querySelectorAll('button'))
                    .find(b => (b.innerText || b.textContent || '').trim().includes('{label}'));
                if (button) {{ button.click(); return true; }}
                return false;
            }})()
            "#,
            label = js_quote(label),
        );
        if self.eval_or(js, false).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(format!("button labeled: {label}")))
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let deadline = Instant::now() + timeout;
        let mut attached = false;
        loop {
            match self.probe_selector(selector).await?.as_str() {
                "visible" => return Ok(WaitOutcome::Ready),
                "hidden" => attached = true,
                _ => {}
            }
            if Instant::now() >= deadline {
                return Ok(if attached {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::ElementNotFound
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_button(
        &self,
        label: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let deadline = Instant::now() + timeout;
        let mut attached = false;
        loop {
            match self.probe_button(label).await?.as_str() {
                "visible" => return Ok(WaitOutcome::Ready),
                "hidden" => attached = true,
                _ => {}
            }
            if Instant::now() >= deadline {
                return Ok(if attached {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::ElementNotFound
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_url(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.current_url().await?.contains(fragment) {
                return Ok(WaitOutcome::Ready);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn first_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector('{selector}');
                if (!el) return null;
                const text = (el.innerText || el.textContent || '').trim();
                return text.length > 0 ? text : null;
            }})()
            "#,
            selector = js_quote(selector),
        );
        self.eval_or(js, None).await
    }

    async fn set_session_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        let param = CookieParam::builder()
            .name(&cookie.name)
            .value(&cookie.value)
            .domain(&cookie.domain)
            .path("/")
            .secure(true)
            .http_only(true)
            .same_site(CookieSameSite::Lax)
            .build()
            .map_err(DriverError::Protocol)?;
        self.page.execute(SetCookiesParams::new(vec![param])).await?;
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<(), DriverError> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .map_err(|e| DriverError::Screenshot(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| DriverError::Screenshot(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

/// Escape a string for interpolation inside single quotes in evaluated JS.
fn js_quote(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
