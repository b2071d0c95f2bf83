use std::fmt::{self, Display};

/// A central error enum for browser-driver errors.
#[derive(Debug)]
pub enum DriverError {
    /// The browser process could not be started.
    Launch(String),
    /// A page load failed outright (DNS, connection, protocol).
    Navigation(String),
    /// An element a step needed was not in the page.
    ElementNotFound(String),
    /// A screenshot could not be captured or written.
    Screenshot(String),
    /// Any other DevTools-protocol failure.
    Protocol(String),
    IoError(std::io::Error),
}

/// Convert from std::io::Error.
impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> DriverError {
        DriverError::IoError(err)
    }
}

/// Convert from chromiumoxide's error type.
/// Without this, `?` won't work on raw CDP calls inside the driver.
impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Launch(msg) => write!(f, "browser launch failed: {}", msg),
            DriverError::Navigation(msg) => write!(f, "navigation failed: {}", msg),
            DriverError::ElementNotFound(what) => write!(f, "element not found: {}", what),
            DriverError::Screenshot(msg) => write!(f, "screenshot failed: {}", msg),
            DriverError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            DriverError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for DriverError {}
