//! Establishes an authenticated browsing session against the panel:
//! replay of a remembered session cookie first, the login form as the
//! fallback.

use log::{error, info};

use crate::browser::driver::{PanelDriver, SessionCookie};
use crate::browser::errors::DriverError;
use crate::config::settings::{Credentials, PanelConfig, Timeouts};
use crate::core::diagnostics;

const EMAIL_SELECTOR: &str = r#"input[name="email"]"#;
const PASSWORD_SELECTOR: &str = r#"input[name="password"]"#;
const SUBMIT_SELECTOR: &str = r#"button[type="submit"]"#;
/// The panel renders login failures in one of these, depending on the page.
const ERROR_BANNER_SELECTOR: &str = ".alert.alert-danger, .error-message, .form-error";

/// Whether a URL is part of the panel's login/auth flow. Landing on one of
/// these after a navigation means the session is not (or no longer) valid.
pub fn is_auth_url(url: &str) -> bool {
    url.contains("login") || url.contains("auth")
}

pub struct Authenticator<'d> {
    driver: &'d dyn PanelDriver,
    panel: &'d PanelConfig,
    timeouts: &'d Timeouts,
}

impl<'d> Authenticator<'d> {
    pub fn new(driver: &'d dyn PanelDriver, panel: &'d PanelConfig, timeouts: &'d Timeouts) -> Self {
        Authenticator {
            driver,
            panel,
            timeouts,
        }
    }

    /// Log in with whatever the credentials offer. `Ok(false)` is a normal
    /// login failure (bad credentials, no redirect); `Err` is a driver-level
    /// failure the orchestrator's outer handler deals with.
    pub async fn login(&self, credentials: &Credentials) -> Result<bool, DriverError> {
        if let Some(token) = credentials.session_token.as_deref() {
            info!("trying session-cookie login");
            if self.probe_session_cookie(token).await? {
                info!("session cookie accepted");
                return Ok(true);
            }
            info!("session cookie rejected, falling back to the login form");
            self.driver.clear_cookies().await?;
        }

        let (Some(email), Some(password)) = (
            credentials.email.as_deref(),
            credentials.password.as_deref(),
        ) else {
            error!("no usable session cookie and no LOGIN_EMAIL/LOGIN_PASSWORD to fall back to");
            return Ok(false);
        };
        self.login_with_form(email, password).await
    }

    /// Inject the remembered cookie and load an authenticated-only page.
    /// Being bounced to a login/auth URL means the token is invalid or
    /// expired.
    async fn probe_session_cookie(&self, token: &str) -> Result<bool, DriverError> {
        let cookie = SessionCookie {
            name: self.panel.session_cookie_name.clone(),
            value: token.to_string(),
            domain: self.panel.session_cookie_domain.clone(),
        };
        self.driver.set_session_cookie(&cookie).await?;
        self.driver.navigate(&self.panel.home_url).await?;
        let url = self.driver.current_url().await?;
        Ok(!is_auth_url(&url))
    }

    async fn login_with_form(&self, email: &str, password: &str) -> Result<bool, DriverError> {
        info!("opening the login page: {}", self.panel.login_url);
        self.driver.navigate(&self.panel.login_url).await?;

        for selector in [EMAIL_SELECTOR, PASSWORD_SELECTOR, SUBMIT_SELECTOR] {
            let outcome = self
                .driver
                .wait_for_selector(selector, self.timeouts.element)
                .await?;
            if !outcome.is_ready() {
                error!("login form did not load: {} was {:?}", selector, outcome);
                diagnostics::capture(self.driver, "login_fail_form_timeout.png").await;
                return Ok(false);
            }
        }

        info!("filling credentials and submitting");
        self.driver.fill(EMAIL_SELECTOR, email).await?;
        self.driver.fill(PASSWORD_SELECTOR, password).await?;
        self.driver.click(SUBMIT_SELECTOR).await?;

        let outcome = self
            .driver
            .wait_for_url(&self.panel.home_url_marker, self.timeouts.navigation)
            .await?;
        if outcome.is_ready() {
            info!("form login succeeded");
            return Ok(true);
        }

        // No redirect within the deadline. The page usually says why.
        match self.driver.first_text(ERROR_BANNER_SELECTOR).await? {
            Some(reason) => {
                error!("form login failed: {}", reason);
                diagnostics::capture(self.driver, "login_fail_error_message.png").await;
            }
            None => {
                error!("form login failed: no redirect and no visible error message");
                diagnostics::capture(self.driver, "login_fail_no_error.png").await;
            }
        }
        Ok(false)
    }
}
