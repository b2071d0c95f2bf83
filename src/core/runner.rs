//! Drives one full run: validate, log in once, extend every configured
//! server, tally the results.

use log::{error, info};
use tokio::time::sleep;

use crate::browser::driver::PanelDriver;
use crate::browser::errors::DriverError;
use crate::config::settings::Settings;
use crate::core::diagnostics;
use crate::core::extender::TimeExtender;
use crate::core::session::Authenticator;

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Lenient policy: one extended server out of many is still a useful
    /// run, so the process reports success whenever anything succeeded.
    pub fn is_success(&self) -> bool {
        self.succeeded >= 1
    }
}

pub struct BatchRunner<'d> {
    driver: &'d dyn PanelDriver,
    settings: &'d Settings,
}

impl<'d> BatchRunner<'d> {
    pub fn new(driver: &'d dyn PanelDriver, settings: &'d Settings) -> Self {
        BatchRunner { driver, settings }
    }

    /// Run the whole batch. Never returns an error: driver failures that
    /// escape the per-server containment are absorbed here and turn into a
    /// failed summary, so the caller can always tear the browser down and
    /// exit with a code.
    pub async fn run(&self) -> RunSummary {
        match self.run_inner().await {
            Ok(summary) => summary,
            Err(e) => {
                error!("run aborted by an unexpected error: {}", e);
                diagnostics::capture(self.driver, "general_error.png").await;
                RunSummary {
                    total: self.settings.targets.len(),
                    succeeded: 0,
                }
            }
        }
    }

    async fn run_inner(&self) -> Result<RunSummary, DriverError> {
        let total = self.settings.targets.len();
        let failed = RunSummary {
            total,
            succeeded: 0,
        };

        // Re-checked here so a runner embedded somewhere other than the CLI
        // still refuses to touch the driver on an unusable configuration.
        if let Err(e) = self.settings.ensure_runnable() {
            error!("{}", e);
            return Ok(failed);
        }

        info!("logging in to the panel");
        let authenticator = Authenticator::new(
            self.driver,
            &self.settings.panel,
            &self.settings.timeouts,
        );
        if !authenticator.login(&self.settings.credentials).await? {
            error!("login failed, aborting the batch");
            return Ok(failed);
        }

        info!("login succeeded, processing {} server(s)", total);
        let extender = TimeExtender::new(
            self.driver,
            &self.settings.panel,
            &self.settings.timeouts,
            &self.settings.pacing,
        );

        let mut succeeded = 0;
        for (index, target) in self.settings.targets.iter().enumerate() {
            if index > 0 {
                sleep(self.settings.pacing.between_targets).await;
            }
            if extender.extend(target).await {
                succeeded += 1;
            }
        }

        let summary = RunSummary { total, succeeded };
        info!(
            "batch finished: {} server(s), {} succeeded, {} failed",
            summary.total,
            summary.succeeded,
            summary.failed()
        );
        Ok(summary)
    }
}
