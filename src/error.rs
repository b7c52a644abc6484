use thiserror::Error;

#[derive(Error, Debug)]
pub enum WifiScoutError {
    #[error("Scan authorization not granted")]
    PermissionDenied,

    #[error("WiFi radio is unavailable or powered off")]
    RadioUnavailable,

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Network '{0}' not found in the current scan results")]
    NotFound(String),

    #[error("Platform rejected the request: {0}")]
    PlatformRejected(String),

    #[error("Operation '{0}' is not supported on this platform")]
    UnsupportedOnPlatform(&'static str),

    #[error("Failed to execute platform command: {0}")]
    PlatformCommand(String),
}
