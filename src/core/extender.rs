//! The per-server extend action: open the management page, find the
//! extend button, click it.

use log::{error, info, warn};
use tokio::time::sleep;

use crate::browser::driver::PanelDriver;
use crate::browser::errors::DriverError;
use crate::config::settings::{Pacing, PanelConfig, ServerTarget, Timeouts};
use crate::core::diagnostics::{self, safe_file_stem};
use crate::core::session::is_auth_url;

pub struct TimeExtender<'d> {
    driver: &'d dyn PanelDriver,
    panel: &'d PanelConfig,
    timeouts: &'d Timeouts,
    pacing: &'d Pacing,
}

impl<'d> TimeExtender<'d> {
    pub fn new(
        driver: &'d dyn PanelDriver,
        panel: &'d PanelConfig,
        timeouts: &'d Timeouts,
        pacing: &'d Pacing,
    ) -> Self {
        TimeExtender {
            driver,
            panel,
            timeouts,
            pacing,
        }
    }

    /// Extend one server's active time. Success means the click was issued;
    /// the panel gives no confirmation worth waiting for. Every failure is
    /// contained here so one bad server never stops the batch.
    pub async fn extend(&self, target: &ServerTarget) -> bool {
        let name = target.display_name();
        info!("=== processing server: {} ===", name);
        match self.try_extend(target, name).await {
            Ok(extended) => extended,
            Err(e) => {
                error!("server {}: driver error: {}", name, e);
                let file = format!("server_error_{}.png", safe_file_stem(name));
                diagnostics::capture(self.driver, &file).await;
                false
            }
        }
    }

    async fn try_extend(&self, target: &ServerTarget, name: &str) -> Result<bool, DriverError> {
        info!("opening server page: {}", target.url);
        self.driver.navigate(&target.url).await?;

        let url = self.driver.current_url().await?;
        if is_auth_url(&url) {
            // Session died mid-batch. Policy: count the target as failed and
            // move on rather than re-logging in.
            warn!("server {}: bounced to {}, session expired", name, url);
            return Ok(false);
        }

        let label = &self.panel.extend_button_label;
        let outcome = self
            .driver
            .wait_for_button(label, self.timeouts.element)
            .await?;
        if !outcome.is_ready() {
            error!("server {}: '{}' button was {:?}", name, label, outcome);
            self.capture_button_failure(name).await;
            return Ok(false);
        }

        match self.driver.click_button(label).await {
            Ok(()) => {}
            // The button can detach between the wait and the click, e.g. on a
            // client-side rerender.
            Err(DriverError::ElementNotFound(_)) => {
                error!("server {}: '{}' button vanished before the click", name, label);
                self.capture_button_failure(name).await;
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        info!("server {}: extend click issued", name);
        sleep(self.pacing.after_extend).await;
        Ok(true)
    }

    async fn capture_button_failure(&self, name: &str) {
        let file = format!("extend_button_not_found_{}.png", safe_file_stem(name));
        diagnostics::capture(self.driver, &file).await;
    }
}
