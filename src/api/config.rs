use std::path::PathBuf;

use crate::capture::CaptureConfig;

/// Number of log lines returned by the status endpoint.
pub const STATUS_TAIL_LINES: usize = 1500;

/// Configuration for the dashboard server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root directory; each task gets a subdirectory named by its id
    pub screenshot_dir: PathBuf,

    /// Capture settings applied to every run started through the API
    pub capture: CaptureConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("screenshots"),
            capture: CaptureConfig::default(),
        }
    }
}
