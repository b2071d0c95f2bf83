//! Run configuration, resolved once at startup from environment variables
//! and handed to the rest of the crate by reference. No ambient reads
//! happen after this point.

use std::env;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use serde::Deserialize;

/// One game server whose management page gets its time extended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerTarget {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ServerTarget {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        ServerTarget {
            url: url.into(),
            name: Some(name.into()),
        }
    }

    /// The configured name, or the last path segment of the URL.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => self
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(&self.url),
        }
    }
}

/// Login material. The session token is tried first; the email/password
/// pair is the fallback. Nothing here outlives the process.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub session_token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Whether any login path could possibly work.
    pub fn is_usable(&self) -> bool {
        self.session_token.is_some() || self.has_password_login()
    }

    pub fn has_password_login(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

/// Everything this tool knows about the target panel. These values mirror
/// the live site and break whenever it changes; they are gathered here so
/// that fixing such a break is a one-file affair.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// An authenticated-only page used to probe session validity.
    pub home_url: String,
    /// URL fragment that confirms a successful login redirect.
    pub home_url_marker: String,
    pub login_url: String,
    pub session_cookie_name: String,
    pub session_cookie_domain: String,
    /// Visible label of the per-server time-extension button.
    pub extend_button_label: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            home_url: "https://gamepanel2.gtxgaming.co.uk/home".into(),
            home_url_marker: "/home".into(),
            login_url: "https://gamepanel2.gtxgaming.co.uk/auth/login".into(),
            session_cookie_name: "remember_web_59ba36addc2b2f9401580f014c7f58ea4e30989d".into(),
            session_cookie_domain: ".gtxgaming.co.uk".into(),
            extend_button_label: "EXTEND 72 HOUR(S)".into(),
        }
    }
}

/// Upper bounds on the two kinds of suspension points. Nothing blocks
/// without one of these.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Waits for form fields and buttons to become visible.
    pub element: Duration,
    /// Waits for page loads and login redirects.
    pub navigation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            element: Duration::from_secs(30),
            navigation: Duration::from_secs(60),
        }
    }
}

/// Fixed delays that keep the run gentle on the panel.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Pause between two servers in the batch.
    pub between_targets: Duration,
    /// Pause after a successful extend click before moving on.
    pub after_extend: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            between_targets: Duration::from_secs(2),
            after_extend: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Headless unless the operator asked for a visible window.
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when absent.
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions {
            headless: true,
            chrome_path: None,
        }
    }
}

/// The resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub targets: Vec<ServerTarget>,
    pub panel: PanelConfig,
    pub timeouts: Timeouts,
    pub pacing: Pacing,
    pub browser: BrowserOptions,
}

impl Settings {
    /// Build the settings from the documented environment variables:
    /// `REMEMBER_WEB_COOKIE`, `LOGIN_EMAIL`, `LOGIN_PASSWORD`,
    /// `SERVER_LIST` (JSON) and `SERVER_URLS` (comma-separated).
    pub fn from_env() -> Self {
        let credentials = Credentials {
            session_token: env_value("REMEMBER_WEB_COOKIE"),
            email: env_value("LOGIN_EMAIL"),
            password: env_value("LOGIN_PASSWORD"),
        };
        let targets = resolve_targets(
            env_value("SERVER_LIST").as_deref(),
            env_value("SERVER_URLS").as_deref(),
        );
        Settings {
            credentials,
            targets,
            panel: PanelConfig::default(),
            timeouts: Timeouts::default(),
            pacing: Pacing::default(),
            browser: BrowserOptions::default(),
        }
    }

    /// Reject configurations that cannot possibly produce a successful run,
    /// before any browser is launched.
    pub fn ensure_runnable(&self) -> Result<(), ConfigError> {
        if !self.credentials.is_usable() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingCredentials,
    NoTargets,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredentials => write!(
                f,
                "missing login credentials: set REMEMBER_WEB_COOKIE, or LOGIN_EMAIL and LOGIN_PASSWORD"
            ),
            ConfigError::NoTargets => write!(
                f,
                "no server targets resolved from SERVER_LIST or SERVER_URLS"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolve the ordered target list. Priority is presence-based:
/// `SERVER_LIST` if set (invalid JSON is logged and treated as unset),
/// then `SERVER_URLS`, then a single hardcoded fallback when neither
/// variable is set at all.
pub fn resolve_targets(server_list: Option<&str>, server_urls: Option<&str>) -> Vec<ServerTarget> {
    if let Some(raw) = server_list {
        match serde_json::from_str::<Vec<ServerTarget>>(raw) {
            Ok(entries) => {
                let mut targets = Vec::with_capacity(entries.len());
                for entry in entries {
                    if entry.url.trim().is_empty() {
                        warn!("skipping SERVER_LIST entry without a url: {:?}", entry);
                        continue;
                    }
                    targets.push(entry);
                }
                return targets;
            }
            Err(e) => {
                warn!("SERVER_LIST is not valid JSON ({}), falling back to SERVER_URLS", e);
            }
        }
    }

    if let Some(raw) = server_urls {
        return raw
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .enumerate()
            .map(|(i, url)| ServerTarget::new(url, format!("Server-{}", i + 1)))
            .collect();
    }

    vec![ServerTarget::new(
        "https://gamepanel2.gtxgaming.co.uk/server/fa13b794",
        "Default-Server",
    )]
}

/// Read an environment variable, treating blank values as unset.
fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
