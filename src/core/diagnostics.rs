//! Best-effort diagnostic artifacts for failure postmortems.

use std::path::Path;

use log::{info, warn};

use crate::browser::driver::PanelDriver;

/// Capture a screenshot of the current page into the working directory.
/// A failure to capture is logged and swallowed so it never masks the
/// failure that prompted the screenshot in the first place.
pub async fn capture(driver: &dyn PanelDriver, file_name: &str) {
    match driver.screenshot(Path::new(file_name)).await {
        Ok(()) => info!("diagnostic screenshot written to {}", file_name),
        Err(e) => warn!("could not capture {}: {}", file_name, e),
    }
}

/// Reduce a server name to characters safe in a screenshot filename.
/// Configured names come from the operator and can contain anything.
pub fn safe_file_stem(raw: &str) -> String {
    let stem: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}
