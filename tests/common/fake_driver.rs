//! A deterministic **in-process stand-in** for any type that implements
//! `gtx_keepalive::browser::driver::PanelDriver`.
//!
//! *  **From the test's perspective**
//!    * Script the panel before the run: `redirect`, `fail_navigation`,
//!      `button_missing_on`, `click_redirects_to`, `page_text`.
//!    * Inspect everything the flow did afterwards via `navigations()`,
//!      `fills()`, `cookies_set()`, `screenshots()` and friends.
//!
//! *  **Why this exists**: It lets integration tests exercise the *real*
//!    login and batch machinery without launching a browser or touching the
//!    network. Waits resolve immediately from the scripted state, so the
//!    production timeouts cost the tests nothing.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gtx_keepalive::browser::driver::{PanelDriver, SessionCookie, WaitOutcome};
use gtx_keepalive::browser::errors::DriverError;

#[derive(Default)]
struct State {
    current_url: String,
    /// navigate(from) lands on `to` instead, like a server-side redirect.
    redirects: HashMap<String, String>,
    /// navigate(url) fails outright, like a dead host.
    failing_navigations: HashSet<String>,
    /// click(selector) moves the page, like a submitted form.
    click_redirects: HashMap<String, String>,
    selector_outcomes: HashMap<String, WaitOutcome>,
    /// Pages on which no labeled button ever shows up.
    missing_button_pages: HashSet<String>,
    texts: HashMap<String, String>,

    navigations: Vec<String>,
    fills: Vec<(String, String)>,
    clicks: Vec<String>,
    clicked_buttons: Vec<String>,
    cookies_set: Vec<SessionCookie>,
    cookie_clears: usize,
    screenshots: Vec<String>,
    call_count: usize,
}

pub struct FakeDriver {
    state: Mutex<State>,
}

impl FakeDriver {
    pub fn new() -> Self {
        FakeDriver {
            state: Mutex::new(State {
                current_url: "about:blank".into(),
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake driver state poisoned")
    }
}

// Scripting and inspection. Each test binary uses its own subset.
#[allow(dead_code)]
impl FakeDriver {
    pub fn redirect(&self, from: &str, to: &str) {
        self.lock().redirects.insert(from.into(), to.into());
    }

    pub fn fail_navigation(&self, url: &str) {
        self.lock().failing_navigations.insert(url.into());
    }

    pub fn click_redirects_to(&self, selector: &str, url: &str) {
        self.lock().click_redirects.insert(selector.into(), url.into());
    }

    pub fn selector_outcome(&self, selector: &str, outcome: WaitOutcome) {
        self.lock().selector_outcomes.insert(selector.into(), outcome);
    }

    pub fn button_missing_on(&self, url: &str) {
        self.lock().missing_button_pages.insert(url.into());
    }

    pub fn page_text(&self, selector: &str, text: &str) {
        self.lock().texts.insert(selector.into(), text.into());
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.lock().fills.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn clicked_buttons(&self) -> Vec<String> {
        self.lock().clicked_buttons.clone()
    }

    pub fn cookies_set(&self) -> Vec<SessionCookie> {
        self.lock().cookies_set.clone()
    }

    pub fn cookie_clears(&self) -> usize {
        self.lock().cookie_clears
    }

    pub fn screenshots(&self) -> Vec<String> {
        self.lock().screenshots.clone()
    }

    /// Total driver calls of any kind, for "no traffic at all" assertions.
    pub fn call_count(&self) -> usize {
        self.lock().call_count
    }
}

#[async_trait]
impl PanelDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.navigations.push(url.into());
        if state.failing_navigations.contains(url) {
            return Err(DriverError::Navigation(format!("{url}: host unreachable")));
        }
        state.current_url = state.redirects.get(url).cloned().unwrap_or_else(|| url.into());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        Ok(state.current_url.clone())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.fills.push((selector.into(), value.into()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.clicks.push(selector.into());
        if let Some(destination) = state.click_redirects.get(selector).cloned() {
            state.current_url = destination;
        }
        Ok(())
    }

    async fn click_button(&self, label: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.clicked_buttons.push(label.into());
        if state.missing_button_pages.contains(&state.current_url) {
            return Err(DriverError::ElementNotFound(format!("button labeled: {label}")));
        }
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        Ok(state
            .selector_outcomes
            .get(selector)
            .copied()
            .unwrap_or(WaitOutcome::Ready))
    }

    async fn wait_for_button(
        &self,
        _label: &str,
        _timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        if state.missing_button_pages.contains(&state.current_url) {
            Ok(WaitOutcome::ElementNotFound)
        } else {
            Ok(WaitOutcome::Ready)
        }
    }

    async fn wait_for_url(
        &self,
        fragment: &str,
        _timeout: Duration,
    ) -> Result<WaitOutcome, DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        if state.current_url.contains(fragment) {
            Ok(WaitOutcome::Ready)
        } else {
            Ok(WaitOutcome::TimedOut)
        }
    }

    async fn first_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        Ok(state.texts.get(selector).cloned())
    }

    async fn set_session_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.cookies_set.push(cookie.clone());
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.cookie_clears += 1;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.call_count += 1;
        state.screenshots.push(path.display().to_string());
        Ok(())
    }
}
