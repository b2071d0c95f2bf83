use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::DriverError;

/// Outcome of a bounded wait, returned as a plain value so callers can
/// branch on it instead of catching timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The element (or URL) showed up in time.
    Ready,
    /// The element was attached but never became visible before the deadline.
    TimedOut,
    /// The element was never attached to the DOM at all.
    ElementNotFound,
}

impl WaitOutcome {
    pub fn is_ready(self) -> bool {
        matches!(self, WaitOutcome::Ready)
    }
}

/// A cookie replayed into the browsing session to restore a server-side
/// login without re-submitting credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// A trait representing the remote-controlled browser the panel is driven
/// through. This is the seam behind which the real CDP session lives; tests
/// substitute a scripted stand-in.
///
/// Selector-taking operations use CSS selectors. `*_button` operations match
/// `<button>` elements by visible label substring instead, since CSS cannot
/// express text content.
#[async_trait]
pub trait PanelDriver: Send + Sync {
    /// Load `url` in the session's single page and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// The URL the page ended up on (after any server-side redirects).
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Focus the element at `selector` and replace its value.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    /// Click the element at `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Click the first `<button>` whose visible label contains `label`.
    async fn click_button(&self, label: &str) -> Result<(), DriverError>;

    /// Wait until the element at `selector` is attached and visible.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError>;

    /// Wait until a `<button>` labeled `label` is attached and visible.
    async fn wait_for_button(
        &self,
        label: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError>;

    /// Wait until the current URL contains `fragment`.
    async fn wait_for_url(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, DriverError>;

    /// Trimmed text of the first element matching `selector`, if any.
    async fn first_text(&self, selector: &str) -> Result<Option<String>, DriverError>;

    /// Inject a session cookie scoped to the panel's domain.
    async fn set_session_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError>;

    /// Drop all cookies held by the browsing session.
    async fn clear_cookies(&self) -> Result<(), DriverError>;

    /// Write a PNG screenshot of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;
}
